use postdeck::application::{error::AppError, posts::PostsService};
use postdeck::config::PrefsAction;

use super::print::print_json;

pub fn handle(service: &mut PostsService, action: PrefsAction) -> Result<(), AppError> {
    match action {
        PrefsAction::Show => {}
        PrefsAction::Theme { mode } => service.set_theme(mode)?,
        PrefsAction::ToggleTheme => {
            service.toggle_theme()?;
        }
        PrefsAction::View { mode } => service.set_view_mode(mode)?,
        PrefsAction::Sort { order } => service.set_sort_order(order)?,
    }
    print_json(&service.preferences())
}
