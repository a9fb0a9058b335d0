//! Integration tests for the world tick: mid-tick deletion, spawning and
//! event delivery.

use std::cell::Cell;
use std::rc::Rc;

use trench_core::{SpatialMap, Vec3, VoxelMap};
use trench_world::{
    emit_fall, CharacterSpawn, GrenadeBody, GrenadeSpawn, KinematicKernel, ObjectId,
    PhysicsKernel, PlayerBody, TickContext, World, WorldEvent,
};

const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct Counters {
    move_player: Cell<usize>,
    move_grenade: Cell<usize>,
    release_player: Cell<usize>,
    release_grenade: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

/// Kinematic kernel that counts the calls it serves.
struct CountingKernel {
    inner: KinematicKernel,
    counters: Rc<Counters>,
}

impl PhysicsKernel for CountingKernel {
    fn create_player(&mut self) -> PlayerBody {
        self.inner.create_player()
    }

    fn create_grenade(&mut self, position: Vec3, velocity: Vec3) -> GrenadeBody {
        self.inner.create_grenade(position, velocity)
    }

    fn release_player(&mut self, body: PlayerBody) {
        bump(&self.counters.release_player);
        self.inner.release_player(body);
    }

    fn release_grenade(&mut self, body: GrenadeBody) {
        bump(&self.counters.release_grenade);
        self.inner.release_grenade(body);
    }

    fn set_globals(&mut self, time: f64, dt: f32) {
        self.inner.set_globals(time, dt);
    }

    fn globals(&self) -> (f64, f32) {
        self.inner.globals()
    }

    fn move_player(&mut self, body: &mut PlayerBody, map: &dyn SpatialMap) -> f32 {
        bump(&self.counters.move_player);
        self.inner.move_player(body, map)
    }

    fn move_grenade(&mut self, body: &mut GrenadeBody, map: &dyn SpatialMap) -> bool {
        bump(&self.counters.move_grenade);
        self.inner.move_grenade(body, map)
    }

    fn reorient_player(&mut self, body: &mut PlayerBody, orientation: Vec3) {
        self.inner.reorient_player(body, orientation);
    }

    fn aim_check(
        &self,
        origin: Vec3,
        orientation: Vec3,
        target: Vec3,
        aim_tolerance: f32,
        dist_tolerance: f32,
    ) -> bool {
        self.inner
            .aim_check(origin, orientation, target, aim_tolerance, dist_tolerance)
    }

    fn can_uncrouch(&self, body: &PlayerBody, map: &dyn SpatialMap) -> bool {
        self.inner.can_uncrouch(body, map)
    }
}

fn counting_world() -> (World, Rc<Counters>) {
    let counters = Rc::new(Counters::default());
    let kernel = CountingKernel {
        inner: KinematicKernel::default(),
        counters: Rc::clone(&counters),
    };
    let world = World::with_map(Box::new(kernel), Box::new(VoxelMap::flat(64, 64, 64, 60)));
    (world, counters)
}

/// A grenade that goes off on the first tick and runs `action`.
fn instant_grenade(action: impl FnOnce(&mut TickContext<'_>) + 'static) -> GrenadeSpawn {
    GrenadeSpawn::new(Vec3::new(5.5, 5.5, 30.5), Vec3::ZERO, 0.0)
        .on_detonate(move |_, ctx| action(ctx))
}

#[test]
fn test_self_delete_is_absent_next_tick() {
    let (mut world, counters) = counting_world();
    let id = world.create_object(instant_grenade(|ctx| {
        let me = ctx.current();
        ctx.delete(me);
    }));

    world.update(DT);
    assert!(!world.objects().contains(id));
    assert_eq!(counters.release_grenade.get(), 1, "released exactly once");

    world.update(DT);
    assert_eq!(counters.move_grenade.get(), 0);
}

#[test]
fn test_deleted_earlier_in_tick_is_not_updated() {
    let (mut world, counters) = counting_world();
    let victim = Rc::new(Cell::new(None::<ObjectId>));

    let target = Rc::clone(&victim);
    world.create_object(instant_grenade(move |ctx| {
        if let Some(id) = target.get() {
            ctx.delete(id);
        }
    }));
    let character = world.create_object(CharacterSpawn::new(Vec3::new(20.5, 20.5, 40.5)));
    victim.set(Some(character));

    world.update(DT);

    assert!(!world.objects().contains(character));
    assert_eq!(counters.move_player.get(), 0);
    assert_eq!(counters.release_player.get(), 1);
    assert!(world.objects().is_empty());
}

#[test]
fn test_spawned_mid_tick_updates_next_tick() {
    let (mut world, counters) = counting_world();
    let spawned = Rc::new(Cell::new(None::<ObjectId>));

    let slot = Rc::clone(&spawned);
    world.create_object(instant_grenade(move |ctx| {
        let id = ctx.spawn(CharacterSpawn::new(Vec3::new(20.5, 20.5, 40.5)));
        slot.set(Some(id));
    }));

    world.update(DT);
    let id = spawned.get().expect("callback ran");
    assert!(world.objects().contains(id));
    assert_eq!(counters.move_player.get(), 0);

    world.update(DT);
    assert_eq!(counters.move_player.get(), 1);
}

#[test]
fn test_update_without_map_does_nothing() {
    let counters = Rc::new(Counters::default());
    let kernel = CountingKernel {
        inner: KinematicKernel::default(),
        counters: Rc::clone(&counters),
    };
    let mut world = World::new(Box::new(kernel));
    let id = world.create_object(CharacterSpawn::new(Vec3::new(1.0, 2.0, 3.0)));

    world.update(DT);

    assert_eq!(world.time(), 0.0);
    assert_eq!(counters.move_player.get(), 0);
    assert_eq!(world.objects().character(id).unwrap().position(), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
#[should_panic(expected = "is not in")]
fn test_delete_missing_object_panics() {
    let (mut world, _) = counting_world();
    let id = world.create_object(CharacterSpawn::new(Vec3::new(1.0, 2.0, 3.0)));
    world.delete(id);
    world.delete(id);
}

#[test]
fn test_hard_landing_emits_fall_event() {
    let (mut world, _) = counting_world();
    let id = world.create_object(CharacterSpawn {
        on_fall: Some(emit_fall()),
        ..CharacterSpawn::new(Vec3::new(20.5, 20.5, 5.0))
    });

    let mut falls = Vec::new();
    for _ in 0..600 {
        world.update(DT);
        falls.extend(world.drain_events());
    }

    assert_eq!(falls.len(), 1, "one landing: {falls:?}");
    let WorldEvent::Fell { object, magnitude } = falls[0] else {
        panic!("expected a fall, got {:?}", falls[0]);
    };
    assert_eq!(object, id);
    assert!(magnitude > 0.0);
    assert_eq!(world.drain_events().count(), 0);
}

#[test]
fn test_airborne_tracks_kernel() {
    let (mut world, _) = counting_world();
    let id = world.create_object(CharacterSpawn::new(Vec3::new(20.5, 20.5, 50.0)));

    world.update(DT);
    let c = world.objects().character(id).unwrap();
    assert!(c.airborne());
    assert_eq!(c.airborne(), c.body().airborne);

    for _ in 0..300 {
        world.update(DT);
    }
    let c = world.objects().character(id).unwrap();
    assert!(!c.airborne());
    assert!(c.velocity().z.abs() < 1e-3);
}

#[test]
fn test_objects_update_in_creation_order() {
    let (mut world, _) = counting_world();
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));

    let ids: Vec<ObjectId> = (0..3)
        .map(|_| {
            let order = Rc::clone(&order);
            world.create_object(instant_grenade(move |ctx| order.borrow_mut().push(ctx.current())))
        })
        .collect();

    world.update(DT);

    assert_eq!(*order.borrow(), ids);
    assert!(world.objects().is_empty());
}
