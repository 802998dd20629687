fn main() -> std::process::ExitCode {
    turing_arena_lib::run()
}
