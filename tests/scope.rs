use std::{error::Error, path::Path};

use test_utils::{check_simulation, Expected};

const SRC_PATH: &str = "./demos/scope.betsy";
const EXPECTED: Expected = Expected {
    stdout: "3\n5\n",
    stderr: "",
};

#[test]
fn simulate_scopes() -> Result<(), Box<dyn Error>> {
    check_simulation(Path::new(SRC_PATH), EXPECTED)
}
