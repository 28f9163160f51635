use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    crystal::cli::main()
}
