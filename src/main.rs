fn main() -> std::io::Result<()> {
    urs_testgen_lib::run()
}
