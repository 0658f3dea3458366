use anyhow::Result;
use mg::Session;

use crate::cli::ProfilesAction;

pub async fn run(session: &Session, action: ProfilesAction) -> Result<()> {
    match action {
        ProfilesAction::List => {
            let count = session.profile_count().await?;
            for index in 0..count {
                let name = session.profile_name(index).await?;
                println!("{index:>3}  {name}");
            }
        }
        ProfilesAction::Show => {
            let profile = session.profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfilesAction::Select { index } => {
            session.select_profile(index).await?;
            println!("selected profile {index}");
        }
        ProfilesAction::Create { name } => {
            let index = session.create_profile(&name).await?;
            session.select_profile(index).await?;
            println!("created and selected profile {index} ({name})");
            println!("note: not durable until `mg profiles commit`");
        }
        ProfilesAction::Commit => {
            session.commit_profiles().await?;
            println!("working profiles committed to storage");
        }
        ProfilesAction::Revert => {
            session.revert_profiles().await?;
            println!("working profiles reverted to storage");
        }
    }
    Ok(())
}
