use anyhow::Result;
use mg::ErrorCode;

pub fn run() -> Result<()> {
    let codes = [
        ErrorCode::Success,
        ErrorCode::GenericError,
        ErrorCode::InvalidArgument,
        ErrorCode::Disconnected,
        ErrorCode::FilesystemError,
        ErrorCode::InvalidSession,
        ErrorCode::NotImplemented,
    ];
    for code in codes {
        println!("{:>3}  {}", code.code(), code.description());
    }
    Ok(())
}
