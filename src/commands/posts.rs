use postdeck::application::error::AppError;
use postdeck::application::posts::{LIST_FAILED_MESSAGE, ListState, PostsService};
use postdeck::config::{ListArgs, PostInput, PostsAction};
use postdeck::domain::error::ResourceError;
use postdeck::domain::validation::PostForm;
use postdeck::domain::view::author_label;
use postdeck_api_types::Post;
use serde::Serialize;

use super::print::{print_json, render_posts};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetail<'a> {
    #[serde(flatten)]
    post: &'a Post,
    author: String,
}

#[derive(Serialize)]
struct Deleted {
    deleted: u64,
}

pub async fn handle(service: &mut PostsService, action: PostsAction) -> Result<(), AppError> {
    match action {
        PostsAction::List(args) => list(service, args).await,
        PostsAction::Get { id } => {
            let post = service.load_detail(id).await?;
            let users = service.authors().await;
            print_json(&PostDetail {
                author: author_label(&users, post.user_id),
                post: &post,
            })
        }
        PostsAction::Create(input) => {
            let post = submit(service, input, None).await?;
            print_json(&post)
        }
        PostsAction::Update { id, input } => {
            let post = submit(service, input, Some(id)).await?;
            print_json(&post)
        }
        PostsAction::Delete { id } => {
            service.delete(id).await?;
            print_json(&Deleted { deleted: id })
        }
    }
}

async fn list(service: &mut PostsService, args: ListArgs) -> Result<(), AppError> {
    if let Some(term) = args.search {
        service.set_search_term(term);
    }
    if let Some(author) = args.author {
        service.set_selected_author(author);
    }
    if let Some(order) = args.sort {
        service.set_sort_order(order)?;
    }
    if let Some(mode) = args.view {
        service.set_view_mode(mode)?;
    }

    let posts = match service.load_list().await {
        ListState::Ready(posts) => posts,
        ListState::Failed { message } => {
            return Err(AppError::unexpected(format!(
                "{LIST_FAILED_MESSAGE}: {message}"
            )));
        }
    };

    if args.json {
        return print_json(&posts);
    }

    let users = service.authors().await;
    print!(
        "{}",
        render_posts(&posts, &users, service.filter().view_mode)
    );
    Ok(())
}

/// Field-level validation messages are folded into the reported error.
async fn submit(
    service: &PostsService,
    input: PostInput,
    editing: Option<u64>,
) -> Result<Post, AppError> {
    let form = PostForm::new(input.title, input.body, input.author);
    service
        .submit(form, editing)
        .await
        .map_err(|err| match err.as_resource() {
            Some(ResourceError::ValidationFailed { errors }) => {
                AppError::validation(format!("{err}: {errors}"))
            }
            _ => err.into(),
        })
}
