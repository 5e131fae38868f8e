use anyhow::Result;

fn main() -> Result<()> {
    model_forms::ui::run()
}
