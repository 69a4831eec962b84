//! Deterministic naming for the character label images and the stage that renders them.

use crate::error::{Error, Result};
use crate::stage::{list_at, table_at, Stage, StageCommand};
use std::path::{Path, PathBuf};

pub const DEFAULT_FONT: &str = "DejaVu-Sans";
pub const DEFAULT_POINT_SIZES: [u32; 8] = [12, 24, 36, 48, 60, 72, 84, 96];

/// `dir/{codepoint}_{point_size / 12 - 1}.png`
pub fn label_image_path(dir: &Path, ch: char, point_size: u32) -> PathBuf {
	let index = i64::from(point_size / 12) - 1;
	dir.join(format!("{}_{index}.png", u32::from(ch)))
}

/// ImageMagick reads `label:@file`, so a few characters are escaped to render literally.
pub fn label_text(ch: char) -> String {
	match ch {
		' ' => r"\ ".into(),
		'@' => r"\@".into(),
		'\\' => r"\\\\".into(),
		c => c.to_string(),
	}
}

/// `convert` invocation for one glyph.
pub fn label_command(dir: &Path, ch: char, point_size: u32, font: &str) -> StageCommand {
	StageCommand::new("convert")
		.args(["-fill", "black", "-background", "white", "-bordercolor", "white", "-font", font])
		.arg("-pointsize")
		.arg(point_size.to_string())
		.arg(format!("label:{}", label_text(ch)))
		.arg(label_image_path(dir, ch, point_size).to_string_lossy())
}

/// Printable ASCII; tabs, newlines and the other whitespace controls get no image.
pub fn label_charset() -> impl Iterator<Item = char> { ' '..='~' }

/// Renders every glyph at every configured size. Reads the `[labels]` table:
/// `output_dir`, `font`, `point_sizes`.
#[derive(Debug, Default)]
pub struct LabelStage;

impl Stage for LabelStage {
	fn name(&self) -> &str { "labels" }

	fn plan(&self, cfg: &toml::Table) -> Result<Vec<StageCommand>> {
		let t = table_at(cfg, "labels")?;
		let dir = PathBuf::from(t.get("output_dir").and_then(|v| v.as_str()).unwrap_or("data/labels"));
		let font = t.get("font").and_then(|v| v.as_str()).unwrap_or(DEFAULT_FONT);
		let sizes = match list_at(&t, "point_sizes")? {
			[] => DEFAULT_POINT_SIZES.to_vec(),
			vals => vals
				.iter()
				.map(|v| {
					v.as_integer()
						.and_then(|i| u32::try_from(i).ok())
						.filter(|&i| i >= 12)
						.ok_or_else(|| Error::config(format!("labels.point_sizes: invalid size {v}")))
				})
				.collect::<Result<Vec<_>>>()?,
		};
		Ok(sizes
			.iter()
			.flat_map(|&pt| label_charset().map(move |ch| (pt, ch)))
			.map(|(pt, ch)| label_command(&dir, ch, pt, font))
			.collect())
	}
}
