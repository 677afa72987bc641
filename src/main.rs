use ledgerbench::error::AppResult;

fn main() -> AppResult<()> {
    ledgerbench::entry::run()
}
