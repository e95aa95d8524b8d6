use keepsake_graph::color::Color8;
use keepsake_graph::math::{Vec2, Vec3, Vec4};
use keepsake_graph::resources::{
    Image, Material, Model, Shader, Vertex, create_material, material_property,
    set_material_property,
};
use keepsake_graph::vfs::{MemorySource, Vfs};
use keepsake_graph::{LoadError, ObjectRef, TypeRegistry, World};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn world(source: &MemorySource) -> World {
    let registry = TypeRegistry::builder()
        .register_standard_resources()
        .build();
    World::new(registry, Vfs::with_default("mem", source.clone()))
}

/// Writes `lit.shader`, `red.mat` and `checker.img`, each referring to the
/// others.
fn write_assets(source: &MemorySource) {
    let mut world = world(source);

    let mut image = Image::new(2, 2);
    image.set_pixel(0, 0, Color8::new(255, 255, 255, 255));
    image.set_pixel(1, 1, Color8::new(255, 255, 255, 255));
    let image = world.insert(image);
    world.save(image, "textures/checker.img").unwrap();

    let mut shader = Shader::new("shaders/lit.spv");
    shader.add_property::<Vec4>("tint");
    shader.add_property::<f32>("roughness");
    shader.add_image_property("albedo");
    let shader = ObjectRef::<Shader>::new(world.insert(shader));
    world.save(shader.id().unwrap(), "lit.shader").unwrap();

    let material = create_material(&mut world, shader).unwrap();
    let id = material.id().unwrap();
    set_material_property(&mut world, id, "tint", Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
    set_material_property(&mut world, id, "roughness", 0.75f32).unwrap();
    let layout = shader.get(&world).unwrap().clone();
    world
        .get_mut::<Material>(id)
        .unwrap()
        .set_image(&layout, "albedo", ObjectRef::new(image))
        .unwrap();
    world.save(id, "red.mat").unwrap();

    // Rewrite the shader now that its material has a location.
    world.save_in_place(shader.id().unwrap()).unwrap();
}

#[test]
fn loading_a_shader_loads_its_materials() {
    init_logging();
    let source = MemorySource::new();
    write_assets(&source);

    let mut world = world(&source);
    let shader = world.get_or_load::<Shader>("lit.shader").unwrap();

    assert_eq!(world.len(), 3);
    let materials = shader.get(&world).unwrap().materials().to_vec();
    assert_eq!(materials.len(), 1);
    let material = materials[0];
    assert_eq!(world.location_of(material.id().unwrap()), Some("red.mat"));
    assert_eq!(material.get(&world).unwrap().shader, shader);
}

#[test]
fn shader_material_cycle_resolves_both_ways() {
    init_logging();
    let source = MemorySource::new();
    write_assets(&source);

    let mut world = world(&source);
    let material = world.get_or_load::<Material>("red.mat").unwrap();

    let shader = material.get(&world).unwrap().shader;
    assert_eq!(world.location_of(shader.id().unwrap()), Some("lit.shader"));
    assert_eq!(shader.get(&world).unwrap().materials(), &[material]);
    assert_eq!(world.get_or_load::<Shader>("lit.shader").unwrap(), shader);
    assert_eq!(world.get_or_load::<Material>("red.mat").unwrap(), material);
    assert_eq!(world.len(), 3);
}

#[test]
fn material_values_and_images_survive_reload() {
    init_logging();
    let source = MemorySource::new();
    write_assets(&source);

    let mut world = world(&source);
    let material = world.get_or_load::<Material>("red.mat").unwrap();
    let id = material.id().unwrap();

    assert_eq!(
        material_property::<Vec4>(&world, id, "tint"),
        Ok(Vec4::new(1.0, 0.0, 0.0, 1.0))
    );
    assert_eq!(material_property::<f32>(&world, id, "roughness"), Ok(0.75));

    let shader = material.get(&world).unwrap().shader.get(&world).unwrap();
    assert_eq!(shader.module_path, "shaders/lit.spv");
    assert_eq!(shader.uniform_size(), 20);
    assert!(shader.has_image_property("albedo"));

    let image = material.get(&world).unwrap().image("albedo").unwrap();
    let image = image.get(&world).unwrap();
    assert_eq!((image.width(), image.height()), (2, 2));
    assert_eq!(image.pixel(1, 1), Some(Color8::new(255, 255, 255, 255)));
    assert_eq!(image.pixel(1, 0), Some(Color8::new(0, 0, 0, 0)));
}

#[test]
fn image_with_wrong_payload_is_rejected() {
    init_logging();
    let source = MemorySource::new();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u32.to_ne_bytes());
    bytes.extend_from_slice(&2u32.to_ne_bytes());
    bytes.extend_from_slice(&3u64.to_le_bytes());
    bytes.extend_from_slice(&[1, 2, 3]);
    source.insert("bad.img", bytes);

    let mut world = world(&source);
    let err = world.get_or_load::<Image>("bad.img").unwrap_err();

    assert!(matches!(err, LoadError::Decode { .. }));
    assert!(world.is_empty());
}

#[test]
fn model_buffers_round_trip() {
    init_logging();
    let source = MemorySource::new();
    let mut vertices = vec![
        Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0), Vec3::z()),
        Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 0.0), Vec3::z()),
        Vertex::new(Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 1.0), Vec3::z()),
        Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 1.0), Vec3::z()),
    ];
    for vertex in &mut vertices {
        vertex.tangent = Vec3::x();
        vertex.bitangent = Vec3::y();
    }
    let model = Model::new(vertices.clone(), vec![0, 1, 2, 0, 2, 3]).unwrap();

    let mut world = world(&source);
    let id = world.insert(model);
    world.save(id, "meshes/quad.model").unwrap();

    let bytes = source.get("meshes/quad.model").unwrap();
    assert_eq!(bytes.len(), 8 + 4 * 56 + 8 + 6 * 4);
    assert_eq!(&bytes[0..8], &4u64.to_le_bytes());

    let mut reloaded = self::world(&source);
    let quad = reloaded.get_or_load::<Model>("meshes/quad.model").unwrap();
    let quad = quad.get(&reloaded).unwrap();
    assert_eq!(quad.vertices(), vertices.as_slice());
    assert_eq!(quad.indices(), &[0, 1, 2, 0, 2, 3]);
}

#[test]
fn model_with_dangling_index_is_rejected() {
    init_logging();
    let source = MemorySource::new();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 56]);
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&5u32.to_ne_bytes());
    source.insert("bad.model", bytes);

    let mut world = world(&source);
    let err = world.get_or_load::<Model>("bad.model").unwrap_err();

    assert!(matches!(err, LoadError::Decode { .. }));
    assert!(world.is_empty());
}
