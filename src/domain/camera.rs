/// Horizontal scrolling by world shift.
///
/// The camera never moves. When the player walks into the outer quarter
/// of the screen, the player is held in place (speed 0) and every
/// non-player layer slides the other way instead. Inside the dead-zone
/// (the middle half of the screen) the player walks at base speed.

#[derive(Clone, Copy, Debug)]
pub struct ScrollSettings {
    pub screen_width: f32,
    /// World shift magnitude while scrolling, px/frame.
    pub scroll_speed: f32,
    /// Player speed inside the dead-zone, px/frame.
    pub base_speed: f32,
}

/// Camera result for one frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ScrollStep {
    /// Added to every non-player layer next frame. Positive = world moves right.
    pub world_shift: f32,
    pub player_speed: f32,
}

pub fn scroll(player_center_x: f32, direction_x: f32, settings: &ScrollSettings) -> ScrollStep {
    let left_edge = settings.screen_width / 4.0;
    let right_edge = settings.screen_width - settings.screen_width / 4.0;

    if player_center_x < left_edge && direction_x < 0.0 {
        ScrollStep { world_shift: settings.scroll_speed, player_speed: 0.0 }
    } else if player_center_x > right_edge && direction_x > 0.0 {
        ScrollStep { world_shift: -settings.scroll_speed, player_speed: 0.0 }
    } else {
        ScrollStep { world_shift: 0.0, player_speed: settings.base_speed }
    }
}
