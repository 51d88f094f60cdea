//! Activator scan.
//!
//! Once per tick the player-controlled entity probes its current room for
//! entities it can activate: interactive ones by oriented-bounding-box
//! overlap, pickable ones by a flat-circle test around a probe point pushed
//! forward along the view axis, with a narrow vertical window. Matches fire
//! the script host's activation callback; the core never applies activation
//! effects itself.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::components::boneframe::BoneFrame;
use crate::components::locality::Locality;
use crate::components::obb::Obb;
use crate::components::status::{EntityStatus, GameId};
use crate::components::transform::Transform;
use crate::resources::player::PlayerRef;
use crate::resources::script::{CallbackKind, ScriptBridge};
use crate::resources::worldmap::WorldMap;

/// Vertical slack of the pickup test, world units either side.
const PICKUP_VERTICAL_WINDOW: f32 = 32.0;

type ActivatorQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static GameId,
        &'static Transform,
        &'static BoneFrame,
        &'static Obb,
        &'static EntityStatus,
        &'static Locality,
    ),
>;

/// Scan the player's room and fire activation callbacks for every match.
pub fn scan_activators(
    query: ActivatorQuery,
    map: Res<WorldMap>,
    mut script: NonSendMut<ScriptBridge>,
    player: Res<PlayerRef>,
) {
    let Some(scanner_entity) = player.0 else {
        return;
    };
    let Ok((_, scanner_id, transform, bf, obb, status, locality)) = query.get(scanner_entity)
    else {
        return;
    };
    if !status.enabled {
        return;
    }
    let Some(room) = locality.room.and_then(|id| map.room(id)) else {
        return;
    };

    // Reach probe: pushed forward along the view axis by the pose's forward
    // bound, at the scanner's origin height.
    let probe = transform.origin() + transform.view() * bf.base.bb_max.y;
    let z_low = transform.origin().z + bf.base.bb_min.z;
    let z_high = transform.origin().z + bf.base.bb_max.z;

    for &candidate in &room.entities {
        if candidate == scanner_entity {
            continue;
        }
        let Ok((_, target_id, target_tr, _, target_obb, target_status, _)) = query.get(candidate)
        else {
            continue;
        };
        if !target_status.enabled {
            continue;
        }

        let hit = if target_status.interactive {
            target_obb.overlaps(obb)
        } else if target_status.pickable {
            let origin = target_tr.origin();
            let dxy = Vec3::new(origin.x - probe.x, origin.y - probe.y, 0.0);
            let r = target_status.activation_radius;
            dxy.length_squared() < r * r
                && origin.z + PICKUP_VERTICAL_WINDOW > z_low
                && origin.z - PICKUP_VERTICAL_WINDOW < z_high
        } else {
            false
        };

        if hit {
            script
                .host_mut()
                .entity_callback(scanner_id.0, target_id.0, CallbackKind::Activate);
        }
    }
}
