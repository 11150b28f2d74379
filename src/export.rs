//! Binding → Go source file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::ir::Binding;

pub const PACKAGE_STMT: &str = "package";
pub const IMPORT_STMT: &str = "import \"github.com/gopherjs/gopherjs/js\"";

impl Binding {
    /// Full file text: package line, import line, then every element in
    /// discovery order, each followed by a blank line. Fails on the first
    /// element that cannot be rendered.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        out.push_str(&format!("{PACKAGE_STMT} {}\n", self.name));
        out.push_str(IMPORT_STMT);
        out.push('\n');
        for elem in self.elements() {
            for line in elem.text()? {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Replace `path` with the rendered binding.
    ///
    /// Rendering happens first, so a render error leaves `path` untouched.
    /// The old file is then removed before the new one is created; a failure
    /// between the two loses it.
    pub fn export(&self, path: &Path) -> Result<()> {
        let text = self.render()?;

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        info!(
            path = %path.display(),
            elements = self.elements().len(),
            bytes = text.len(),
            "binding written"
        );
        Ok(())
    }
}
