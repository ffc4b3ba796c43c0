use crate::output::{render_stories, render_suggestions};
use crate::state::AppState;
use crate::views::stories::load_stories;

pub async fn stories(state: &AppState) -> String {
    render_stories(&load_stories(&state.store).await)
}

pub fn suggestions() -> String {
    render_suggestions()
}
