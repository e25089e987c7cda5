use super::PickError;
use crate::color::{Color, Rgb16};

/// Pick through the desktop portal; the compositor draws its own picker.
pub fn pick() -> Result<Color, PickError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PickError::PortalUnavailable(format!("failed to create runtime: {e}")))?;

    rt.block_on(pick_portal())
}

async fn pick_portal() -> Result<Color, PickError> {
    use ashpd::desktop::Color as PortalColor;

    let request = PortalColor::pick()
        .send()
        .await
        .map_err(|e| PickError::PortalUnavailable(format!("color request failed: {e}")))?;

    let color = request.response().map_err(|e| match e {
        ashpd::Error::Response(ashpd::desktop::ResponseError::Cancelled) => PickError::Cancelled,
        e => PickError::Wayland(format!("color response failed: {e}")),
    })?;

    Ok(Color::from(Rgb16::from_unit(
        color.red(),
        color.green(),
        color.blue(),
    )))
}
