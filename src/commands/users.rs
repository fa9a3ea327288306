use postdeck::application::{error::AppError, posts::PostsService};
use postdeck::config::UsersAction;

use super::print::print_json;

pub async fn handle(service: &PostsService, action: UsersAction) -> Result<(), AppError> {
    match action {
        UsersAction::List => {
            let users = service.cache().users().await?;
            print_json(users.as_ref())
        }
        UsersAction::Get { id } => {
            let user = service.cache().user(id).await?;
            print_json(&user)
        }
    }
}
