//! End-to-end tick tests: a real world, the full system chain, and the
//! channel bridge, exercised over several simulated frames.

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use glam::{Quat, Vec3};

use marrowengine::components::boneframe::BoneFrame;
use marrowengine::components::locality::Locality;
use marrowengine::components::motion::{HeightInfo, Motion};
use marrowengine::components::obb::Obb;
use marrowengine::components::status::{EntityStatus, GameId};
use marrowengine::components::transform::Transform;
use marrowengine::components::weapon::{WeaponPose, WeaponState};
use marrowengine::events::audio::AudioCmd;
use marrowengine::events::camera::CameraShake;
use marrowengine::resources::audiobridge::setup_audio;
use marrowengine::resources::modelstore::{
    AnimCommand, AnimDispatch, Animation, BoneSpec, EFFECT_SHAKE_SCREEN, FRAME_PERIOD, FollowUp,
    Frame, FrameFlags, ModelStore, SkeletalModel, StateChange,
};
use marrowengine::resources::physicsworld::PhysicsWorld;
use marrowengine::resources::player::PlayerRef;
use marrowengine::resources::script::ScriptBridge;
use marrowengine::resources::worldmap::{
    EngineVersion, Room, Sector, SectorFlags, SectorMaterial, WorldMap,
};
use marrowengine::resources::worldtime::WorldTime;
use marrowengine::systems::activation::scan_activators;
use marrowengine::systems::audio::{forward_audio_cmds, update_audio_cmds, update_camera_shakes};
use marrowengine::systems::boundingvolume::update_bounding_volumes;
use marrowengine::systems::frame::animate_entities;
use marrowengine::systems::pose::update_poses;
use marrowengine::systems::rigidbody::sync_rigid_bodies;
use marrowengine::systems::time::update_world_time;
use marrowengine::systems::weapon::update_weapon_overlays;

// A hair past one period, so boundary crossings survive float rounding.
const TICK: f32 = FRAME_PERIOD + 1e-4;

fn frame(bb: f32) -> Frame {
    Frame {
        offsets: vec![Vec3::ZERO],
        rotations: vec![Quat::IDENTITY],
        bb_min: Vec3::splat(-bb),
        bb_max: Vec3::splat(bb),
        centre: Vec3::ZERO,
        root_shift: Vec3::ZERO,
        flags: FrameFlags::default(),
        move_delta: Vec3::ZERO,
        jump: (0.0, 0.0),
    }
}

fn animation(state_id: u32, frames: usize, bb: f32) -> Animation {
    Animation {
        state_id,
        speed: 0.0,
        accel: 0.0,
        frames: vec![frame(bb); frames],
        follow: None,
        commands: vec![],
        state_changes: vec![],
    }
}

fn one_bone_model(id: u32, animations: Vec<Animation>) -> SkeletalModel {
    SkeletalModel {
        id,
        bones: vec![BoneSpec::default()],
        animations,
    }
}

fn flat_map() -> WorldMap {
    WorldMap {
        rooms: vec![Room {
            id: 0,
            z_min: -4096.0,
            z_max: 4096.0,
            overlaps: vec![],
            quicksand: false,
            sectors: vec![Sector {
                owner_room: 0,
                min: [0.0, 0.0],
                max: [4096.0, 4096.0],
                material: SectorMaterial::Stone,
                flags: SectorFlags::default(),
                trigger_index: None,
                above: None,
                below: None,
            }],
            entities: vec![],
        }],
        version: EngineVersion::default(),
    }
}

/// World with every resource the full chain needs, plus the audio receiver.
fn build_world(models: Vec<SkeletalModel>) -> (World, Receiver<AudioCmd>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = World::new();
    let rx = setup_audio(&mut world);
    world.insert_resource(Messages::<CameraShake>::default());

    let mut store = ModelStore::new();
    for model in models {
        store.register(model).unwrap();
    }
    world.insert_resource(store);
    world.insert_resource(flat_map());
    world.insert_resource(WorldTime::default());
    world.insert_resource(PlayerRef::default());
    world.insert_resource(PhysicsWorld::new());
    world.insert_non_send_resource(ScriptBridge::default());
    (world, rx)
}

fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            animate_entities,
            update_weapon_overlays,
            update_poses,
            sync_rigid_bodies,
            update_bounding_volumes,
            scan_activators,
            forward_audio_cmds,
            update_audio_cmds,
            update_camera_shakes,
        )
            .chain(),
    );
    schedule
}

fn run_tick(world: &mut World, schedule: &mut Schedule) {
    update_world_time(world, TICK);
    schedule.run(world);
}

fn spawn_entity(world: &mut World, id: u32, model: &SkeletalModel, pos: Vec3) -> Entity {
    let bf = BoneFrame::new(model);
    let mut transform = Transform::default();
    transform.set_origin(pos);
    world
        .spawn((
            GameId(id),
            bf,
            transform,
            EntityStatus::default(),
            Obb::default(),
            Locality::default(),
            Motion::default(),
        ))
        .id()
}

#[test]
fn state_dispatch_lands_through_full_schedule() {
    let mut a0 = animation(0, 4, 64.0);
    a0.state_changes = vec![StateChange {
        state_id: 5,
        dispatches: vec![AnimDispatch {
            frame_low: 0,
            frame_high: 3,
            next_animation: 1,
            next_frame: 0,
        }],
    }];
    let model = one_bone_model(0, vec![a0, animation(5, 4, 96.0)]);
    let (mut world, _rx) = build_world(vec![model.clone()]);

    let entity = spawn_entity(&mut world, 1, &model, Vec3::new(512.0, 512.0, 0.0));
    world.get_mut::<BoneFrame>(entity).unwrap().requested_state = 5;

    let mut schedule = tick_schedule();
    run_tick(&mut world, &mut schedule);

    let bf = world.get::<BoneFrame>(entity).unwrap();
    assert_eq!(bf.base.current_animation, 1);
    assert_eq!(bf.base.current_frame, 0);
    // Dispatch landed, so the request is satisfied.
    assert_eq!(bf.requested_state, 5);
    assert_eq!(bf.last_state, 5);
    // Pose solved against the new animation's bounds, OBB follows.
    assert!((bf.base.bb_min - Vec3::splat(-96.0)).length() < 1e-3);
    let obb = world.get::<Obb>(entity).unwrap();
    assert!((obb.half - Vec3::splat(96.0)).length() < 1e-3);
    assert!((obb.centre - Vec3::new(512.0, 512.0, 0.0)).length() < 1e-3);
    // Locality resolved from the pose centroid.
    let locality = world.get::<Locality>(entity).unwrap();
    assert_eq!(locality.room, Some(0));
    assert!(locality.sector.is_some());
}

#[test]
fn water_gated_sound_crosses_the_bridge() {
    let mut a0 = animation(0, 4, 64.0);
    a0.commands = vec![AnimCommand::PlaySound {
        frame: 1,
        sound: 100,
        water_only: true,
        land_only: false,
    }];
    let model = one_bone_model(0, vec![a0]);
    let (mut world, rx) = build_world(vec![model.clone()]);

    let entity = spawn_entity(&mut world, 1, &model, Vec3::new(512.0, 512.0, 0.0));
    // Shallow water: surface between the feet and the wade depth.
    world.get_mut::<Motion>(entity).unwrap().height_info = HeightInfo {
        water: true,
        transition_level: 100.0,
    };

    let mut schedule = tick_schedule();

    // First tick crosses frame 0; the substance cache is still dry, but the
    // sound is bound to frame 1 anyway.
    run_tick(&mut world, &mut schedule);
    assert!(rx.try_recv().is_err());

    // Second tick crosses frame 1 with the water substance cached.
    run_tick(&mut world, &mut schedule);
    assert_eq!(
        rx.try_recv(),
        Ok(AudioCmd::PlaySound {
            sound: 100,
            entity: 1,
        })
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn end_of_animation_offset_keeps_pre_flip_heading() {
    // The final frame carries both a position offset command and the
    // direction-change flag. Commands run before root motion, so the offset
    // translates in the heading the entity had before the turn.
    let mut a0 = animation(0, 2, 64.0);
    a0.frames[1].flags.insert(FrameFlags::CHANGE_DIRECTION);
    a0.commands = vec![AnimCommand::SetPosition {
        offset: Vec3::new(0.0, 10.0, 0.0),
    }];
    a0.follow = Some(FollowUp {
        animation: 1,
        frame: 0,
    });
    let model = one_bone_model(0, vec![a0, animation(0, 2, 64.0)]);
    let (mut world, _rx) = build_world(vec![model.clone()]);

    let entity = spawn_entity(&mut world, 1, &model, Vec3::new(512.0, 512.0, 0.0));

    let mut schedule = tick_schedule();
    // First tick crosses frame 0; the second crosses the final frame into
    // the follow-up.
    run_tick(&mut world, &mut schedule);
    run_tick(&mut world, &mut schedule);

    let transform = world.get::<Transform>(entity).unwrap();
    assert!((transform.origin() - Vec3::new(512.0, 522.0, 0.0)).length() < 1e-3);
    assert!((transform.angles.x - 180.0).abs() < 1e-3);
    let bf = world.get::<BoneFrame>(entity).unwrap();
    assert_eq!(bf.base.current_animation, 1);
}

#[test]
fn screen_shake_reaches_the_camera_queue() {
    let mut a0 = animation(0, 4, 64.0);
    a0.commands = vec![AnimCommand::PlayEffect {
        frame: 0,
        effect: EFFECT_SHAKE_SCREEN,
    }];
    let model = one_bone_model(0, vec![a0]);
    let (mut world, _rx) = build_world(vec![model.clone()]);

    // The shaking entity is the player, so falloff distance is zero.
    let entity = spawn_entity(&mut world, 1, &model, Vec3::new(512.0, 512.0, 0.0));
    world.insert_resource(PlayerRef(Some(entity)));

    let mut schedule = tick_schedule();
    run_tick(&mut world, &mut schedule);

    let shakes: Vec<CameraShake> = world
        .resource_mut::<Messages<CameraShake>>()
        .drain()
        .collect();
    assert_eq!(shakes.len(), 1);
    assert!((shakes[0].power - 0.8).abs() < 1e-4);
    assert!((shakes[0].duration - 0.5).abs() < 1e-6);
}

#[test]
fn weapon_draw_reaches_idle_over_ticks() {
    let main = one_bone_model(0, vec![animation(0, 2, 64.0)]);
    // Two-handed set: draw animation (index 1) has 3 frames.
    let weapon = one_bone_model(
        9,
        vec![
            animation(0, 3, 0.0),
            animation(0, 3, 0.0),
            animation(0, 4, 0.0),
            animation(0, 3, 0.0),
            animation(0, 2, 0.0),
        ],
    );
    let (mut world, _rx) = build_world(vec![main.clone(), weapon]);

    let entity = spawn_entity(&mut world, 1, &main, Vec3::new(512.0, 512.0, 0.0));
    let mut wp = WeaponPose::new(9);
    wp.ready = true;
    world.entity_mut(entity).insert(wp);

    let mut schedule = tick_schedule();

    // First tick attaches the overlay and starts the draw.
    run_tick(&mut world, &mut schedule);
    assert_eq!(
        world.get::<WeaponPose>(entity).unwrap().state,
        WeaponState::HideToReady
    );
    assert_eq!(world.get::<BoneFrame>(entity).unwrap().overlays.len(), 1);
    world.get_mut::<WeaponPose>(entity).unwrap().ready = false;

    // Drawing takes frame_count - 1 more ticks.
    run_tick(&mut world, &mut schedule);
    assert_eq!(
        world.get::<WeaponPose>(entity).unwrap().state,
        WeaponState::HideToReady
    );
    run_tick(&mut world, &mut schedule);
    assert_eq!(
        world.get::<WeaponPose>(entity).unwrap().state,
        WeaponState::Idle
    );
    let bf = world.get::<BoneFrame>(entity).unwrap();
    assert_eq!(bf.overlays[0].current_animation, 0);
    assert_eq!(bf.overlays[0].current_frame, 0);
}

#[test]
fn disabled_entity_is_left_alone() {
    let model = one_bone_model(0, vec![animation(0, 4, 64.0)]);
    let (mut world, rx) = build_world(vec![model.clone()]);

    let entity = spawn_entity(&mut world, 1, &model, Vec3::new(512.0, 512.0, 0.0));
    world.get_mut::<EntityStatus>(entity).unwrap().disable();

    let mut schedule = tick_schedule();
    for _ in 0..4 {
        run_tick(&mut world, &mut schedule);
    }

    let bf = world.get::<BoneFrame>(entity).unwrap();
    assert_eq!(bf.base.current_frame, 0);
    let locality = world.get::<Locality>(entity).unwrap();
    assert_eq!(locality.room, None);
    assert!(rx.try_recv().is_err());
}
