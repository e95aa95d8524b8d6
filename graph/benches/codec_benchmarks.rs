use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use keepsake_graph::math::{Vec3, Vec4};
use keepsake_graph::scene::{add_behavior, set_parent};
use keepsake_graph::vfs::{MemorySource, Vfs};
use keepsake_graph::{Category, Kind, Node, Reflect, TypeRegistry, World};

// ---------------------------------------------------------------------------
// Helper kinds
// ---------------------------------------------------------------------------

#[derive(Default, Reflect)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
    color: Vec4,
    lifetime: f32,
    seed: u64,
    alive: bool,
    label: String,
}

#[derive(Default, Reflect)]
struct Spin {
    speed: f32,
    axis: Vec3,
}

fn world() -> World {
    let registry = TypeRegistry::builder()
        .register::<Particle>(Category::Resource)
        .register_behavior::<Spin>(None)
        .build();
    World::new(registry, Vfs::with_default("mem", MemorySource::new()))
}

fn particle() -> Particle {
    Particle {
        position: Vec3::new(1.0, 2.0, 3.0),
        velocity: Vec3::new(0.0, -9.8, 0.0),
        color: Vec4::new(1.0, 0.5, 0.25, 1.0),
        lifetime: 2.5,
        seed: 42,
        alive: true,
        label: "spark".to_owned(),
    }
}

/// Root with `width` children, each holding `width` leaves with one behavior.
fn scene(world: &mut World, width: usize) -> keepsake_graph::ObjectId {
    let root = world.spawn_node("root");
    for i in 0..width {
        let branch = world.spawn_node(&format!("branch{i}"));
        set_parent(world, branch, root);
        for j in 0..width {
            let leaf = world.spawn_node(&format!("leaf{i}_{j}"));
            set_parent(world, leaf, branch);
            add_behavior::<Spin>(world, leaf);
        }
    }
    root
}

// ---------------------------------------------------------------------------
// Field lists
// ---------------------------------------------------------------------------

fn bench_encode_fields(c: &mut Criterion) {
    let mut world = world();
    let id = world.insert(particle());
    c.bench_function("encode_field_list", |b| {
        b.iter(|| black_box(world.encode(black_box(id)).unwrap()));
    });
}

fn bench_decode_fields(c: &mut Criterion) {
    let mut world = world();
    let id = world.insert(particle());
    let bytes = world.encode(id).unwrap();
    c.bench_function("decode_field_list", |b| {
        b.iter_batched(
            self::world,
            |mut world| black_box(world.load_from_bytes(Particle::HASH, &bytes).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Scene trees
// ---------------------------------------------------------------------------

fn bench_encode_scene(c: &mut Criterion) {
    let mut world = world();
    let root = scene(&mut world, 16);
    c.bench_function("encode_scene_16x16", |b| {
        b.iter(|| black_box(world.encode(root).unwrap()));
    });
}

fn bench_decode_scene(c: &mut Criterion) {
    let mut world = world();
    let root = scene(&mut world, 16);
    let bytes = world.encode(root).unwrap();
    c.bench_function("decode_scene_16x16", |b| {
        b.iter_batched(
            self::world,
            |mut world| black_box(world.load_from_bytes(Node::HASH, &bytes).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_encode_fields,
    bench_decode_fields,
    bench_encode_scene,
    bench_decode_scene,
);
criterion_main!(benches);
