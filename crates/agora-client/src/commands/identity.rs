use agora_shared::session::Credentials;

use crate::error::Result;
use crate::state::AppState;

pub async fn sign_in(
    state: &AppState,
    email: String,
    display_name: Option<String>,
    photo_ref: Option<String>,
) -> Result<String> {
    let session = state
        .gate
        .sign_in(Credentials {
            email,
            display_name,
            photo_ref,
        })
        .await?;
    Ok(format!(
        "Signed in as {} <{}> ({})\n",
        session.display_name_or_default(),
        session.email,
        session.id.short()
    ))
}

pub fn sign_out(state: &AppState) -> String {
    state.gate.sign_out();
    "Signed out\n".to_string()
}

pub fn whoami(state: &AppState) -> Result<String> {
    let session = state.gate.require()?;
    Ok(format!(
        "{} <{}>\n  id: {}\n  mode: {}\n",
        session.display_name_or_default(),
        session.email,
        session.id,
        if state.offline { "offline" } else { state.config.server_url.as_str() }
    ))
}
