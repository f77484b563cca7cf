#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use lcstack::models::{FilterBand, Measurement};

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the working directory temporarily set to `dir`.
///
/// Restores the previous directory on unwind, and serializes access to the
/// process-global working directory so parallel tests do not interfere.
pub fn with_current_dir<F, R>(dir: &Path, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedDir::enter(dir);
    f()
}

struct ScopedDir {
    previous: std::path::PathBuf,
}

impl ScopedDir {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().expect("current dir");
        std::env::set_current_dir(dir).expect("enter test dir");
        Self { previous }
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

/// A usable measurement at zero point 25.
pub fn measurement(index: usize, jd: f64, band: FilterBand, flux: f64, unc: f64) -> Measurement {
    Measurement::new(index, jd, band, Some(flux), Some(unc), 25.0)
}

/// One row in the ZTF forced-photometry service's default column layout.
pub fn ztf_row(index: usize, band: &str, zp: f64, jd: f64, flux: &str, unc: &str, chisq: &str) -> String {
    let mut cells: Vec<String> = (0..30).map(|_| "0".to_string()).collect();
    cells[0] = index.to_string();
    cells[1] = "1739".to_string();
    cells[4] = band.to_string();
    cells[20] = format!("{:.6}", zp);
    cells[22] = format!("{:.6}", jd);
    cells[24] = flux.to_string();
    cells[25] = unc.to_string();
    cells[27] = chisq.to_string();
    cells.join(" ")
}

/// Header line as written by the forced-photometry service.
pub const ZTF_HEADER: &str = " index, field, ccdid, qid, filter, pid, infobitssci, sciinpseeing, scibckgnd, scisigpix, zpmaginpsci, zpmaginpsciunc, zpmaginpscirms, clrcoeff, clrcoeffunc, ncalmatches, exptime, adpctdif1, adpctdif2, diffmaglim, zpdiff, programid, jd, rfid, forcediffimflux, forcediffimfluxunc, forcediffimsnr, forcediffimchisq, forcediffimfluxap, forcediffimfluxuncap,";

/// A small ZTF light curve: two g epochs that stack to a detection, one r
/// epoch below threshold, and one failed fit.
pub fn ztf_sample() -> String {
    let mut lines = vec![
        "# ZTF forced-photometry service".to_string(),
        "# Requested input R.A. = 150.000000 degrees".to_string(),
        "#".to_string(),
        ZTF_HEADER.to_string(),
    ];
    lines.push(ztf_row(0, "ZTF_g", 25.0, 2459000.70, "100.0", "10.0", "1.02"));
    lines.push(ztf_row(1, "ZTF_g", 25.0, 2459001.20, "120.0", "12.0", "0.97"));
    lines.push(ztf_row(2, "ZTF_r", 25.0, 2459000.80, "-5.0", "2.0", "1.10"));
    lines.push(ztf_row(3, "ZTF_r", 26.0, 2459004.00, "null", "null", "null"));
    lines.join("\n") + "\n"
}

/// Deterministic multi-band light curve with `n` epochs spread over ~`n / 4`
/// days, using a linear congruential sequence for noise.
pub fn synthetic_light_curve(n: usize) -> Vec<Measurement> {
    let bands = [FilterBand::ZtfG, FilterBand::ZtfR, FilterBand::ZtfI];
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut jd = 2459000.5;
    (0..n)
        .map(|i| {
            jd += 0.05 + 0.4 * next();
            let unc = 5.0 + 10.0 * next();
            let flux = 50.0 + unc * (next() - 0.5) * 4.0;
            let zp = 25.5 + next();
            Measurement::new(i, jd, bands[i % bands.len()], Some(flux), Some(unc), zp)
        })
        .collect()
}
