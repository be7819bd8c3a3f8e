//! Phong material coefficients read from material library files.
//!
//! Only four tags are understood: `Ka`, `Kd` and `Ks` (an RGB triple, stored
//! as its mean) and `Ns` (the specular exponent). Everything else in the file
//! is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Scalar Phong coefficients for one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Ambient reflectance.
    pub ka: f32,
    /// Diffuse reflectance.
    pub kd: f32,
    /// Specular reflectance.
    pub ks: f32,
    /// Specular exponent.
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ka: 0.1,
            kd: 0.5,
            ks: 0.5,
            shininess: 10.0,
        }
    }
}

impl Material {
    /// Parses material text. Tags that are absent keep their default value.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut material = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let mut tokens = line.split_whitespace();

            let parsed = match tokens.next() {
                Some("Ka") => mean_rgb(tokens).map(|v| material.ka = v),
                Some("Kd") => mean_rgb(tokens).map(|v| material.kd = v),
                Some("Ks") => mean_rgb(tokens).map(|v| material.ks = v),
                Some("Ns") => tokens
                    .next()
                    .and_then(|t| t.parse().ok())
                    .map(|v| material.shininess = v),
                _ => Some(()),
            };

            if parsed.is_none() {
                log::warn!(
                    "material line {}: skipping malformed coefficient '{}'",
                    idx + 1,
                    line.trim()
                );
            }
        }

        Ok(material)
    }

    /// Loads a material file, falling back to [`Material::default`] when the
    /// file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let result = File::open(path).and_then(|file| Self::from_reader(BufReader::new(file)));

        match result {
            Ok(material) => {
                log::debug!("Loaded material '{}': {:?}", path.display(), material);
                material
            }
            Err(e) => {
                log::warn!(
                    "Failed to read material '{}': {}, using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

fn mean_rgb<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<f32> {
    let mut sum = 0.0;
    for _ in 0..3 {
        sum += tokens.next()?.parse::<f32>().ok()?;
    }
    Some(sum / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn coefficients_are_rgb_means() {
        let source = "\
newmtl Gold
Ka 0.3 0.6 0.9
Kd 1.0 0.5 0.0
Ks 0.2 0.2 0.2
Ns 32
";
        let m = Material::from_reader(source.as_bytes()).unwrap();
        assert!(approx(m.ka, 0.6));
        assert!(approx(m.kd, 0.5));
        assert!(approx(m.ks, 0.2));
        assert!(approx(m.shininess, 32.0));
    }

    #[test]
    fn absent_tags_keep_defaults() {
        let m = Material::from_reader("Kd 0.9 0.9 0.9\n".as_bytes()).unwrap();
        assert!(approx(m.kd, 0.9));
        assert_eq!(m.ka, 0.1);
        assert_eq!(m.ks, 0.5);
        assert_eq!(m.shininess, 10.0);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let source = "Ka 0.4 nope 0.4\nKs 1 1\nNs\nKd 0.3 0.3 0.3\nillum 2\n";
        let m = Material::from_reader(source.as_bytes()).unwrap();
        assert_eq!(m.ka, 0.1);
        assert_eq!(m.ks, 0.5);
        assert_eq!(m.shininess, 10.0);
        assert!(approx(m.kd, 0.3));
    }

    #[test]
    fn missing_file_yields_defaults() {
        assert_eq!(
            Material::load("definitely/not/here.mtl"),
            Material::default()
        );
    }

    #[test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("vitrine-material-{}.mtl", std::process::id()));
        std::fs::write(&path, "Ns 64\n").unwrap();
        let m = Material::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(m.shininess, 64.0);
    }
}
