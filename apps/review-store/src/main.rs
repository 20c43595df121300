fn main() -> anyhow::Result<()> {
    review_store::run()
}
