// A cornell box with one material of every kind, lit by a 4000K blackbody panel.
//
// Usage: cargo run --release --example cornell [config.json] [output.png]
use std::path::Path;

use anyhow::Context;
use spectral_tracer::{
    conductor::Conductor,
    dielectric::Dielectric,
    fresnel::{ComplexIor, ThinFilm},
    plastic::Plastic,
    BruteForceIntersector, Camera, Material, RenderConfig, Renderer, RgbClass, Scene, Spectrum,
    Triangle, Vec3d, Vertex,
};

const WHITE: u32 = 0;
const RED: u32 = 1;
const GREEN: u32 = 2;
const LIGHT: u32 = 3;
const GOLD: u32 = 4;
const PLASTIC: u32 = 5;
const GLASS: u32 = 6;

fn materials() -> Vec<Material> {
    let reflectance = |r, g, b| Spectrum::from_rgb(RgbClass::Reflectance, Vec3d::new(r, g, b));
    vec![
        Material::diffuse(reflectance(0.73, 0.73, 0.73)),
        Material::diffuse(reflectance(0.65, 0.05, 0.05)),
        Material::diffuse(reflectance(0.12, 0.45, 0.15)),
        Material::diffuse(Spectrum::ZERO)
            .with_emission(Spectrum::from_blackbody_normalized(4000.0) * 15.0),
        Material::conductor(Conductor::new(Spectrum::ONE, 0.15).with_ior(ComplexIor::gold())),
        Material::plastic(
            Plastic::new(reflectance(0.1, 0.2, 0.6), 0.2, 1.5).with_thin_film(ThinFilm {
                thickness: 350.0,
                ior: 1.35,
            }),
        ),
        Material::dielectric(Dielectric::new(0.02, 1.5)),
    ]
}

#[derive(Default)]
struct Builder {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl Builder {
    // corners in counter clockwise order seen from the side the normal points to
    fn quad(&mut self, corners: [Vec3d; 4], material: u32) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize();
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|p| Vertex::new(*p, normal)));
        self.triangles
            .push(Triangle::new([base, base + 1, base + 2], material));
        self.triangles
            .push(Triangle::new([base, base + 2, base + 3], material));
    }

    // axis aligned box, flat shaded
    fn cuboid(&mut self, min: Vec3d, max: Vec3d, material: u32) {
        let p = |x: bool, y: bool, z: bool| {
            Vec3d::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        let (f, t) = (false, true);
        self.quad([p(f, f, f), p(f, t, f), p(t, t, f), p(t, f, f)], material);
        self.quad([p(f, f, t), p(t, f, t), p(t, t, t), p(f, t, t)], material);
        self.quad([p(f, f, f), p(t, f, f), p(t, f, t), p(f, f, t)], material);
        self.quad([p(f, t, f), p(f, t, t), p(t, t, t), p(t, t, f)], material);
        self.quad([p(f, f, f), p(f, f, t), p(f, t, t), p(f, t, f)], material);
        self.quad([p(t, f, f), p(t, t, f), p(t, t, t), p(t, f, t)], material);
    }

    // UV sphere with smooth normals
    fn sphere(&mut self, center: Vec3d, radius: f64, material: u32) {
        const RINGS: u32 = 24;
        const SEGMENTS: u32 = 48;
        let base = self.vertices.len() as u32;
        for ring in 0..=RINGS {
            let theta = std::f64::consts::PI * f64::from(ring) / f64::from(RINGS);
            for segment in 0..=SEGMENTS {
                let phi = std::f64::consts::TAU * f64::from(segment) / f64::from(SEGMENTS);
                let normal = Vec3d::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                self.vertices
                    .push(Vertex::new(center + radius * normal, normal));
            }
        }
        let index = |ring: u32, segment: u32| base + ring * (SEGMENTS + 1) + segment;
        for ring in 0..RINGS {
            for segment in 0..SEGMENTS {
                let a = index(ring, segment);
                let b = index(ring + 1, segment);
                let c = index(ring + 1, segment + 1);
                let d = index(ring, segment + 1);
                if ring != 0 {
                    self.triangles.push(Triangle::new([a, b, d], material));
                }
                if ring != RINGS - 1 {
                    self.triangles.push(Triangle::new([b, c, d], material));
                }
            }
        }
    }
}

fn cornell_box() -> anyhow::Result<Scene> {
    let v = Vec3d::new;
    let mut builder = Builder::default();
    // floor, ceiling and back wall
    builder.quad([v(-1., -1., 0.), v(1., -1., 0.), v(1., 1., 0.), v(-1., 1., 0.)], WHITE);
    builder.quad([v(-1., -1., 2.), v(-1., 1., 2.), v(1., 1., 2.), v(1., -1., 2.)], WHITE);
    builder.quad([v(-1., 1., 0.), v(1., 1., 0.), v(1., 1., 2.), v(-1., 1., 2.)], WHITE);
    // side walls
    builder.quad([v(-1., -1., 0.), v(-1., 1., 0.), v(-1., 1., 2.), v(-1., -1., 2.)], RED);
    builder.quad([v(1., -1., 0.), v(1., -1., 2.), v(1., 1., 2.), v(1., 1., 0.)], GREEN);
    // the light sits slightly below the ceiling and faces down
    builder.quad(
        [v(-0.3, -0.3, 1.99), v(-0.3, 0.3, 1.99), v(0.3, 0.3, 1.99), v(0.3, -0.3, 1.99)],
        LIGHT,
    );

    builder.cuboid(v(-0.7, 0.1, 0.0), v(-0.2, 0.6, 1.1), GOLD);
    builder.sphere(v(0.45, 0.3, 0.35), 0.35, PLASTIC);
    builder.sphere(v(0.0, -0.45, 0.3), 0.3, GLASS);

    Scene::new(builder.vertices, builder.triangles, materials()).context("invalid cornell box")
}

fn save_image(path: &Path, rgba: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RenderConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => RenderConfig {
            width: 256,
            height: 256,
            samples_per_frame: 4,
            max_frames: 32,
            ..RenderConfig::default()
        },
    };
    let output = args.next().unwrap_or_else(|| "cornell.png".to_owned());

    spectral_tracer::cie::initialize();
    let scene = cornell_box()?;
    let intersector = BruteForceIntersector::new(&scene);
    let camera = Camera::look_at(
        Vec3d::new(0.0, -3.8, 1.0),
        Vec3d::new(0.0, 0.0, 1.0),
        Vec3d::Z,
        40.0,
        config.width,
        config.height,
    );
    if config.max_frames == 0 {
        anyhow::bail!("max_frames must be set to render to a file");
    }

    let mut renderer = Renderer::new(config, camera, &scene, &intersector)?;
    let start = std::time::Instant::now();
    while renderer.render_frame() {
        log::info!(
            "frame {}/{}",
            renderer.film().frames(),
            renderer.config().max_frames
        );
    }
    log::info!("rendered in {:?}", start.elapsed());

    let film = renderer.film();
    save_image(
        Path::new(&output),
        &film.to_rgba8(),
        film.width(),
        film.height(),
    )
}
