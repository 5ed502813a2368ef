use std::{error::Error, path::Path};

use test_utils::check_diagnostics;

const SRC_PATH: &str = "./demos/unterminated.betsy";

#[test]
fn missing_end_is_fatal_and_annotated() -> Result<(), Box<dyn Error>> {
    check_diagnostics(
        Path::new(SRC_PATH),
        &[
            "ERROR: Missing 'end' for 'do'.",
            ":1:1 NOTE:  The block starts here.",
        ],
    )
}
