//! `retrobench` command-line entry point

fn main() {
    std::process::exit(retrobench::exit_code(retrobench::run()));
}
