use std::path::Path;

use folio::transform_all;

use crate::shared::report;

pub fn run(profiles: &Path, raw_dir: &Path, output_dir: &Path) -> Result<(), i32> {
    let written = transform_all(profiles, raw_dir, output_dir).map_err(report)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
