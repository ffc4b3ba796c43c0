use crate::error::Result;
use crate::output::render_profile;
use crate::state::{AnyStore, AppState};
use crate::views::{ProfileField, ProfilePage};

/// Field values given on the command line. `None` leaves a field as is.
#[derive(Debug, Default)]
pub struct ProfileEdit {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub photo: Option<String>,
}

impl ProfileEdit {
    fn changes(self) -> impl Iterator<Item = (ProfileField, String)> {
        [
            (ProfileField::DisplayName, self.display_name),
            (ProfileField::Bio, self.bio),
            (ProfileField::Location, self.location),
            (ProfileField::Website, self.website),
            (ProfileField::Photo, self.photo),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }
}

async fn loaded_page(state: &AppState) -> Result<ProfilePage<AnyStore>> {
    let session = state.gate.require()?;
    let mut page = ProfilePage::new(state.store.clone(), session);
    page.load().await;
    Ok(page)
}

fn render(page: &ProfilePage<AnyStore>) -> String {
    render_profile(page.profile(), &page.session().email, page.posts().len())
}

pub async fn show(state: &AppState) -> Result<String> {
    let page = loaded_page(state).await?;
    Ok(render(&page))
}

pub async fn edit(state: &AppState, edit: ProfileEdit) -> Result<String> {
    let mut page = loaded_page(state).await?;
    page.begin_edit();
    for (field, value) in edit.changes() {
        page.set_field(field, value);
    }
    page.save().await?;
    Ok(render(&page))
}
