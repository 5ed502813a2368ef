use std::{error::Error, path::Path};

use test_utils::{check_simulation, Expected};

const SRC_PATH: &str = "./demos/loop.betsy";
const EXPECTED: Expected = Expected {
    stdout: "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n",
    stderr: "",
};

#[test]
fn simulate_loop() -> Result<(), Box<dyn Error>> {
    check_simulation(Path::new(SRC_PATH), EXPECTED)
}
