//! Build script for the Sensor Dash firmware.
//!
//! Puts `memory.x` where the linker will find it (the firmware is one member
//! of a workspace, so the crate root isn't always on the search path) and
//! writes the firmware version to `version.txt` for `main.rs` to include.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
	// Put `memory.x` in our output directory and ensure it's
	// on the linker search path.
	let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
	File::create(out.join("memory.x"))
		.unwrap()
		.write_all(include_bytes!("memory.x"))
		.unwrap();
	println!("cargo:rustc-link-search={}", out.display());

	// By default, Cargo will re-run a build script whenever
	// any file in the project changes. By specifying `memory.x`
	// here, we ensure the build script is only re-run when
	// `memory.x` is changed.
	println!("cargo:rerun-if-changed=memory.x");

	// Generate a file containing the firmware version. Builds from a
	// tarball have no git, so fall back to the package version.
	let version = std::process::Command::new("git")
		.current_dir(env::var_os("CARGO_MANIFEST_DIR").unwrap())
		.args(["describe", "--tags", "--dirty"])
		.output()
		.ok()
		.filter(|output| output.status.success())
		.and_then(|output| String::from_utf8(output.stdout).ok())
		.map(|text| text.trim().to_owned())
		.filter(|text| !text.is_empty())
		.unwrap_or_else(|| String::from(env!("CARGO_PKG_VERSION")));
	println!("Version is {:?}", version);

	// Write the file
	std::fs::write(out.join("version.txt"), version).expect("writing version file");
}
