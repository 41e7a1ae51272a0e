use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    thinkchat::cli::main()
}
