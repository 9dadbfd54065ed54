use std::path::PathBuf;

use anyhow::Context;
use menu_structurer::LayoutProfile;
use menu_structurer::extract::{fragments, read_document};
use menu_structurer::group::{is_excluded, is_heading};

fn main() -> anyhow::Result<()> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: dump-fragments <menu.pdf>")?;
    let text = read_document(&path)?;
    let profile = LayoutProfile::default();

    println!("=== FRAGMENTS ===");
    for (i, fragment) in fragments(&text).iter().enumerate() {
        let kind = if is_heading(fragment, &profile) {
            "H"
        } else if is_excluded(fragment, &profile) {
            "-"
        } else {
            " "
        };
        println!("{i:>4} {kind} {fragment:?}");
    }

    Ok(())
}
