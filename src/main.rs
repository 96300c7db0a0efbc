fn main() -> anyhow::Result<()> {
    showroom::flow::run()
}
