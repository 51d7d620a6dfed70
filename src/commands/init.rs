use crate::core::errors::{Error, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Callmap Configuration

[files]
# Extensions scanned for source files, without a leading dot
extensions = ["f90"]
# Glob patterns excluded from the walk
exclude = []

[analysis]
# Callable names left out of call resolution, e.g. library routines
ignore = []
# Uncomment to cap branch expansion depth
# max_depth = 16

[output]
default_format = "terminal"
"#;

pub fn init_config(force: bool) -> Result<()> {
    write_default_config(Path::new(".callmap.toml"), force)?;
    println!("Created .callmap.toml configuration file");
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Configuration(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        )));
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
