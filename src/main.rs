use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sparkle::cli::main()
}
