//! Flat-text export of the recorded time series.
//!
//! Rows are comma-space delimited with no header, each value printed with its
//! `Display` form:
//!
//! ```text
//! 0, 100, 0
//! 1, 98, 1
//! ```

use crate::core::stats::StepSample;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DELIMITER: &str = ", ";

/// Files written by [`export_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub concentration: PathBuf,
    pub temperature: PathBuf,
}

/// Write `step, reagents, products` rows.
pub fn write_concentration<W: Write>(mut out: W, samples: &[StepSample]) -> Result<()> {
    for s in samples {
        writeln!(out, "{}{DELIMITER}{}{DELIMITER}{}", s.step, s.reagents, s.products)?;
    }
    out.flush()?;
    Ok(())
}

/// Write `step, temperature` rows.
pub fn write_temperature<W: Write>(mut out: W, samples: &[StepSample]) -> Result<()> {
    for s in samples {
        writeln!(out, "{}{DELIMITER}{}", s.step, s.temperature)?;
    }
    out.flush()?;
    Ok(())
}

/// Write both series into `dir`, creating it if needed.
///
/// File names are `<basename>=<initial_count>.csv` and
/// `<basename>=<initial_count>_temperatura.csv`.
pub fn export_run(
    dir: &Path,
    basename: &str,
    initial_count: usize,
    samples: &[StepSample],
) -> Result<ExportPaths> {
    fs::create_dir_all(dir)?;
    let paths = ExportPaths {
        concentration: dir.join(format!("{basename}={initial_count}.csv")),
        temperature: dir.join(format!("{basename}={initial_count}_temperatura.csv")),
    };
    write_concentration(BufWriter::new(File::create(&paths.concentration)?), samples)?;
    write_temperature(BufWriter::new(File::create(&paths.temperature)?), samples)?;
    info!(
        rows = samples.len(),
        concentration = %paths.concentration.display(),
        temperature = %paths.temperature.display(),
        "exported time series"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn samples() -> Vec<StepSample> {
        vec![
            StepSample {
                step: 0,
                reagents: 4,
                products: 0,
                temperature: 2.5,
            },
            StepSample {
                step: 1,
                reagents: 2,
                products: 1,
                temperature: 0.125,
            },
        ]
    }

    #[test]
    fn concentration_rows() -> Result<()> {
        let mut buf = Vec::new();
        write_concentration(&mut buf, &samples())?;
        assert_eq!(String::from_utf8_lossy(&buf), "0, 4, 0\n1, 2, 1\n");
        Ok(())
    }

    #[test]
    fn temperature_rows() -> Result<()> {
        let mut buf = Vec::new();
        write_temperature(&mut buf, &samples())?;
        assert_eq!(String::from_utf8_lossy(&buf), "0, 2.5\n1, 0.125\n");
        Ok(())
    }

    #[test]
    fn export_run_writes_both_files() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("reactsim-export-{}", std::process::id()));
        let paths = export_run(&dir, "dadosNum", 4, &samples())?;
        assert!(paths.concentration.ends_with("dadosNum=4.csv"));
        assert_eq!(fs::read_to_string(&paths.concentration)?, "0, 4, 0\n1, 2, 1\n");
        assert_eq!(fs::read_to_string(&paths.temperature)?, "0, 2.5\n1, 0.125\n");
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn unwritable_target_is_reported() -> Result<()> {
        // A regular file where the directory should be.
        let file = std::env::temp_dir().join(format!("reactsim-blocker-{}", std::process::id()));
        fs::write(&file, b"x")?;
        let err = export_run(&file, "dadosNum", 4, &samples()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        fs::remove_file(&file)?;
        Ok(())
    }
}
