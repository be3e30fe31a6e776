//! Flat-file report sinks for the typed pull rows.
//!
//! Persistence stays swappable: the sink consumes anything implementing
//! [`TabularRecord`] and replaces the target file atomically, with the same tmp-file +
//! rename discipline as the token store, so downstream readers never observe a
//! half-written report.

// std
use std::{
	borrow::Cow,
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::store::StoreError;

/// Row shape renderable into a delimited report file.
pub trait TabularRecord {
	/// Column names, in output order.
	const HEADER: &'static [&'static str];

	/// Renders the row's values in header order.
	fn fields(&self) -> Vec<String>;
}

/// CSV report file replaced atomically on every write.
#[derive(Clone, Debug)]
pub struct CsvFile {
	path: PathBuf,
}
impl CsvFile {
	/// Creates a sink writing to the provided path.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Returns the path the sink writes to.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Replaces the file contents with a header line and one line per record.
	pub fn write_records<R>(&self, records: &[R]) -> Result<(), StoreError>
	where
		R: TabularRecord,
	{
		let mut contents = String::new();

		push_line(&mut contents, R::HEADER.iter().map(|column| Cow::Borrowed(*column)));

		for record in records {
			push_line(&mut contents, record.fields().into_iter().map(Cow::Owned));
		}

		self.replace_contents(contents.as_bytes())
	}

	fn replace_contents(&self, bytes: &[u8]) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create report directory {}: {e}", parent.display()),
			})?;
		}

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(bytes).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}

fn push_line<'a>(buffer: &mut String, fields: impl Iterator<Item = Cow<'a, str>>) {
	for (index, field) in fields.enumerate() {
		if index > 0 {
			buffer.push(',');
		}

		buffer.push_str(&escape(&field));
	}

	buffer.push('\n');
}

// Minimal RFC 4180 quoting: only fields containing the delimiter, quotes, or line breaks
// are wrapped.
fn escape(field: &str) -> Cow<'_, str> {
	if field.contains([',', '"', '\n', '\r']) {
		Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
	} else {
		Cow::Borrowed(field)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use time::OffsetDateTime;
	// self
	use super::*;

	struct DemoRow {
		name: String,
		amount: f64,
	}
	impl TabularRecord for DemoRow {
		const HEADER: &'static [&'static str] = &["name", "amount"];

		fn fields(&self) -> Vec<String> {
			vec![self.name.clone(), self.amount.to_string()]
		}
	}

	fn temp_path() -> PathBuf {
		let unique = format!(
			"partner_broker_report_{}_{}.csv",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn escaping_quotes_only_what_needs_quoting() {
		assert_eq!(escape("plain"), "plain");
		assert_eq!(escape("with,comma"), "\"with,comma\"");
		assert_eq!(escape("with \"quote\""), "\"with \"\"quote\"\"\"");
		assert_eq!(escape("with\nnewline"), "\"with\nnewline\"");
	}

	#[test]
	fn written_file_carries_header_and_rows() {
		let path = temp_path();
		let sink = CsvFile::new(&path);
		let rows = [
			DemoRow { name: "Widget, large".into(), amount: 19.9 },
			DemoRow { name: "Bolt".into(), amount: 2.0 },
		];

		sink.write_records(&rows).expect("Report write should succeed.");

		let contents = fs::read_to_string(&path).expect("Report file should be readable.");

		assert_eq!(contents, "name,amount\n\"Widget, large\",19.9\nBolt,2\n");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary report file {}: {e}", path.display())
		});
	}
}
