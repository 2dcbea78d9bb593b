fn main() -> std::process::ExitCode {
    issuerank_lib::run()
}
