//! Bounding volume and locality updater.
//!
//! Runs after the pose solver: refreshes each entity's oriented bounding box
//! from the interpolated pose bounds, re-resolves which room and sector the
//! entity stands in, processes the sector it is leaving (climb flags, death
//! zones, triggers) and caches the substance state for this tick's command
//! interpretation.

use bevy_ecs::prelude::*;

use crate::components::boneframe::BoneFrame;
use crate::components::locality::Locality;
use crate::components::motion::{Motion, resolve_substance};
use crate::components::obb::Obb;
use crate::components::status::{EntityStatus, GameId};
use crate::components::transform::Transform;
use crate::resources::player::PlayerRef;
use crate::resources::script::{ActivatorKind, ScriptBridge, Scripting};
use crate::resources::worldmap::{SectorFlags, SectorId, WorldMap};

/// Apply the standing sector's flags: climbability onto the motion state,
/// death zones onto health, and the sector trigger into the script host.
pub fn process_sector(
    sector_id: SectorId,
    map: &WorldMap,
    mut motion: Option<&mut Motion>,
    status: &mut EntityStatus,
    script: &mut dyn Scripting,
    game_id: u32,
    is_player: bool,
) {
    let Some(sector) = map.sector(sector_id) else {
        return;
    };

    if let Some(motion) = motion.as_deref_mut() {
        let walls = sector.flags.0 & SectorFlags::CLIMB_ANY_WALL.0;
        motion.climb.walls_mask = walls as u8;
        motion.climb.walls_climb = walls != 0;
        motion.climb.ceiling_climb = map.ceiling_climbable(sector_id);

        if sector.flags.contains(SectorFlags::DEATH) && motion.vulnerable_to_death_sector() {
            motion.health = 0.0;
            status.kill_pending = true;
        }
    }

    if let Some(trigger_index) = sector.trigger_index {
        let activator = if is_player {
            ActivatorKind::Player
        } else {
            ActivatorKind::Misc
        };
        // The trigger's integer result is the script's business; the core
        // only guarantees the call happens.
        let _ = script.run_trigger(trigger_index, activator, game_id);
    }
}

/// Re-resolve room and sector from the pose centroid. Entities that do not
/// move under their own power re-register in the room's entity list when
/// they cross into a non-overlapping room; characters are re-registered by
/// their movement host instead.
#[allow(clippy::too_many_arguments)]
pub fn update_room_pos(
    entity: Entity,
    game_id: u32,
    bf: &BoneFrame,
    transform: &Transform,
    locality: &mut Locality,
    mut motion: Option<&mut Motion>,
    status: &mut EntityStatus,
    map: &mut WorldMap,
    script: &mut dyn Scripting,
    is_player: bool,
) {
    let centroid = (bf.base.bb_min + bf.base.bb_max) * 0.5;
    let pos = transform.transform_point(centroid);
    let Some(new_room) = map.find_room(pos, locality.room) else {
        return;
    };

    if let Some(current) = locality.sector {
        process_sector(
            current,
            map,
            motion.as_deref_mut(),
            status,
            script,
            game_id,
            is_player,
        );
    }

    let new_sector = map.sector_at(new_room, pos);
    // A sector can belong to an alternate room sharing the footprint; its
    // owner is authoritative for placement.
    let new_room = new_sector
        .and_then(|sid| map.sector(sid))
        .map_or(new_room, |s| s.owner_room);

    if motion.is_none()
        && locality.room != Some(new_room)
        && let Some(old_room) = locality.room
        && !map.rooms_overlap(old_room, new_room)
    {
        map.remove_entity(old_room, entity);
        map.add_entity(new_room, entity);
    }

    locality.room = Some(new_room);
    locality.last_sector = locality.sector;
    if locality.sector != new_sector {
        locality.sector_status = false;
        locality.sector = new_sector;
    }
}

/// Per-tick driver: OBB refresh, locality update, substance cache.
pub fn update_bounding_volumes(
    mut query: Query<(
        Entity,
        &GameId,
        &BoneFrame,
        &Transform,
        &mut Obb,
        &mut Locality,
        &mut EntityStatus,
        Option<&mut Motion>,
    )>,
    mut map: ResMut<WorldMap>,
    mut script: NonSendMut<ScriptBridge>,
    player: Res<PlayerRef>,
) {
    for (entity, id, bf, transform, mut obb, mut locality, mut status, mut motion) in
        query.iter_mut()
    {
        if !status.enabled {
            continue;
        }

        obb.rebuild(bf.base.bb_min, bf.base.bb_max);
        obb.transform_by(&transform.matrix);

        update_room_pos(
            entity,
            id.0,
            bf,
            transform,
            &mut locality,
            motion.as_deref_mut(),
            &mut status,
            &mut map,
            script.host_mut(),
            player.0 == Some(entity),
        );

        if let Some(motion) = motion.as_deref_mut() {
            let in_quicksand_room = locality
                .room
                .and_then(|id| map.room(id))
                .is_some_and(|r| r.quicksand);
            motion.substance =
                resolve_substance(motion, in_quicksand_room, transform.origin().z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::motion::{HeightInfo, MoveType, Substance};
    use crate::resources::modelstore::{Animation, BoneSpec, Frame, FrameFlags, SkeletalModel};
    use crate::resources::worldmap::{EngineVersion, Room, Sector, SectorMaterial};
    use glam::{Quat, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingHost {
        triggers: Rc<RefCell<Vec<(u32, ActivatorKind, u32)>>>,
    }

    impl Scripting for RecordingHost {
        fn run_trigger(
            &mut self,
            trigger_index: u32,
            activator: ActivatorKind,
            entity_id: u32,
        ) -> i32 {
            self.triggers
                .borrow_mut()
                .push((trigger_index, activator, entity_id));
            1
        }

        fn entity_callback(
            &mut self,
            _activator_id: u32,
            _target_id: u32,
            _kind: crate::resources::script::CallbackKind,
        ) {
        }
    }

    fn one_bone_model() -> SkeletalModel {
        SkeletalModel {
            id: 0,
            bones: vec![BoneSpec::default()],
            animations: vec![Animation {
                state_id: 0,
                speed: 0.0,
                accel: 0.0,
                frames: vec![Frame {
                    offsets: vec![Vec3::ZERO],
                    rotations: vec![Quat::IDENTITY],
                    bb_min: Vec3::splat(-64.0),
                    bb_max: Vec3::splat(64.0),
                    centre: Vec3::ZERO,
                    root_shift: Vec3::ZERO,
                    flags: FrameFlags::default(),
                    move_delta: Vec3::ZERO,
                    jump: (0.0, 0.0),
                }],
                follow: None,
                commands: vec![],
                state_changes: vec![],
            }],
        }
    }

    fn room(id: u32, x0: f32, trigger: Option<u32>, flags: SectorFlags) -> Room {
        Room {
            id,
            z_min: -4096.0,
            z_max: 4096.0,
            overlaps: vec![],
            quicksand: false,
            sectors: vec![Sector {
                owner_room: id,
                min: [x0, 0.0],
                max: [x0 + 1024.0, 1024.0],
                material: SectorMaterial::Stone,
                flags,
                trigger_index: trigger,
                above: None,
                below: None,
            }],
            entities: vec![],
        }
    }

    fn placed_entity(x: f32) -> (BoneFrame, Transform, Locality) {
        let model = one_bone_model();
        let mut bf = BoneFrame::new(&model);
        bf.base.bb_min = Vec3::splat(-64.0);
        bf.base.bb_max = Vec3::splat(64.0);
        let mut transform = Transform::default();
        transform.set_origin(Vec3::new(x, 512.0, 0.0));
        (bf, transform, Locality::default())
    }

    #[test]
    fn crossing_rooms_reregisters_static_entities() {
        let mut map = WorldMap {
            rooms: vec![
                room(0, 0.0, None, SectorFlags::default()),
                room(1, 1024.0, None, SectorFlags::default()),
            ],
            version: EngineVersion::default(),
        };
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let (bf, mut transform, mut locality) = placed_entity(512.0);
        let mut status = EntityStatus::default();
        let mut host = RecordingHost::default();

        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        assert_eq!(locality.room, Some(0));
        assert!(locality.sector.is_some());

        // Move into the second room; old registration is swapped over.
        map.add_entity(0, entity);
        transform.set_origin(Vec3::new(1500.0, 512.0, 0.0));
        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        assert_eq!(locality.room, Some(1));
        assert!(map.room(0).unwrap().entities.is_empty());
        assert_eq!(map.room(1).unwrap().entities, vec![entity]);
    }

    #[test]
    fn overlapping_rooms_keep_registration() {
        let mut a = room(0, 0.0, None, SectorFlags::default());
        a.overlaps = vec![1];
        let map_rooms = vec![a, room(1, 1024.0, None, SectorFlags::default())];
        let mut map = WorldMap {
            rooms: map_rooms,
            version: EngineVersion::default(),
        };
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let (bf, mut transform, mut locality) = placed_entity(512.0);
        let mut status = EntityStatus::default();
        let mut host = RecordingHost::default();

        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        map.add_entity(0, entity);

        transform.set_origin(Vec3::new(1500.0, 512.0, 0.0));
        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        // Locality tracks the new room but the registration stays put.
        assert_eq!(locality.room, Some(1));
        assert_eq!(map.room(0).unwrap().entities, vec![entity]);
        assert!(map.room(1).unwrap().entities.is_empty());
    }

    #[test]
    fn sector_owner_room_overrides_placement() {
        // Two rooms share the footprint; the scanned room's sector belongs
        // to the other one, and the owner wins for placement.
        let mut shadow = room(0, 0.0, None, SectorFlags::default());
        shadow.sectors[0].owner_room = 1;
        let mut map = WorldMap {
            rooms: vec![shadow, room(1, 0.0, None, SectorFlags::default())],
            version: EngineVersion::default(),
        };
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let (bf, transform, mut locality) = placed_entity(512.0);
        let mut status = EntityStatus::default();
        let mut host = RecordingHost::default();

        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        assert_eq!(locality.room, Some(1));
        assert_eq!(locality.sector, Some(SectorId { room: 0, index: 0 }));
    }

    #[test]
    fn sector_change_resets_sector_status() {
        let mut map = WorldMap {
            rooms: vec![
                room(0, 0.0, None, SectorFlags::default()),
                room(1, 1024.0, None, SectorFlags::default()),
            ],
            version: EngineVersion::default(),
        };
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let (bf, mut transform, mut locality) = placed_entity(512.0);
        let mut status = EntityStatus::default();
        let mut host = RecordingHost::default();

        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        locality.sector_status = true;
        let first_sector = locality.sector;

        // Same sector: the flag keeps whatever the host set.
        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        assert!(locality.sector_status);

        transform.set_origin(Vec3::new(1500.0, 512.0, 0.0));
        update_room_pos(
            entity, 1, &bf, &transform, &mut locality, None, &mut status, &mut map, &mut host,
            false,
        );
        assert!(!locality.sector_status);
        assert_eq!(locality.last_sector, first_sector);
    }

    #[test]
    fn death_sector_kills_grounded_entities_only() {
        let map = WorldMap {
            rooms: vec![room(0, 0.0, None, SectorFlags::DEATH)],
            version: EngineVersion::default(),
        };
        let sector_id = SectorId { room: 0, index: 0 };
        let mut host = RecordingHost::default();

        let mut motion = Motion::default();
        let mut status = EntityStatus::default();
        process_sector(
            sector_id,
            &map,
            Some(&mut motion),
            &mut status,
            &mut host,
            1,
            false,
        );
        assert_eq!(motion.health, 0.0);
        assert!(status.kill_pending);

        let mut motion = Motion {
            move_type: MoveType::FreeFalling,
            ..Default::default()
        };
        let mut status = EntityStatus::default();
        process_sector(
            sector_id,
            &map,
            Some(&mut motion),
            &mut status,
            &mut host,
            1,
            false,
        );
        assert_ne!(motion.health, 0.0);
        assert!(!status.kill_pending);
    }

    #[test]
    fn triggers_fire_with_activator_kind() {
        let map = WorldMap {
            rooms: vec![room(0, 0.0, Some(42), SectorFlags::default())],
            version: EngineVersion::default(),
        };
        let sector_id = SectorId { room: 0, index: 0 };
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut host = RecordingHost {
            triggers: Rc::clone(&calls),
        };
        let mut status = EntityStatus::default();

        process_sector(sector_id, &map, None, &mut status, &mut host, 9, true);
        process_sector(sector_id, &map, None, &mut status, &mut host, 10, false);
        assert_eq!(
            calls.borrow().as_slice(),
            &[
                (42, ActivatorKind::Player, 9),
                (42, ActivatorKind::Misc, 10),
            ]
        );
    }

    #[test]
    fn climb_flags_land_on_motion() {
        let map = WorldMap {
            rooms: vec![room(
                0,
                0.0,
                None,
                SectorFlags(SectorFlags::CLIMB_NORTH.0 | SectorFlags::CLIMB_EAST.0),
            )],
            version: EngineVersion::default(),
        };
        let mut motion = Motion::default();
        let mut status = EntityStatus::default();
        let mut host = RecordingHost::default();
        process_sector(
            SectorId { room: 0, index: 0 },
            &map,
            Some(&mut motion),
            &mut status,
            &mut host,
            1,
            false,
        );
        assert!(motion.climb.walls_climb);
        assert_eq!(motion.climb.walls_mask, 0b0011);
        assert!(!motion.climb.ceiling_climb);
    }

    #[test]
    fn substance_is_cached_each_tick() {
        let mut room0 = room(0, 0.0, None, SectorFlags::default());
        room0.quicksand = true;
        let map = WorldMap {
            rooms: vec![room0],
            version: EngineVersion::default(),
        };
        let mut world = World::new();
        world.insert_resource(map);
        world.insert_resource(PlayerRef(None));
        world.insert_non_send_resource(ScriptBridge::default());

        let model = one_bone_model();
        let mut bf = BoneFrame::new(&model);
        bf.base.bb_min = Vec3::splat(-64.0);
        bf.base.bb_max = Vec3::splat(64.0);
        let mut transform = Transform::default();
        transform.set_origin(Vec3::new(512.0, 512.0, 0.0));
        let motion = Motion {
            height_info: HeightInfo {
                water: false,
                transition_level: 2048.0,
            },
            ..Default::default()
        };
        let entity = world
            .spawn((
                GameId(1),
                bf,
                transform,
                Obb::default(),
                Locality::default(),
                EntityStatus::default(),
                motion,
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(update_bounding_volumes);
        schedule.run(&mut world);

        let motion = world.get::<Motion>(entity).unwrap();
        assert_eq!(motion.substance, Substance::QuicksandConsumed);
        let obb = world.get::<Obb>(entity).unwrap();
        assert_eq!(obb.half, Vec3::splat(64.0));
        assert!((obb.centre - Vec3::new(512.0, 512.0, 0.0)).length() < 1e-4);
        let locality = world.get::<Locality>(entity).unwrap();
        assert_eq!(locality.room, Some(0));
    }
}
