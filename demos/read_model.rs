//! Load a model file (OBJ or glTF) on the background loader and print what arrived

use anyhow::{bail, Result};
use showroom_core::Drawable;
use showroom_io::{AssetLoader, AssetSource};
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: read_model <model.obj|model.glb>");
    };

    let mut loader = AssetLoader::spawn(AssetSource::parse(&path));
    let mut last_percent = None;
    let mesh = loop {
        if let Some(result) = loader.poll() {
            break result?;
        }
        let percent = loader.progress().percent().floor() as u32;
        if last_percent != Some(percent) {
            println!("{:>3}%", percent);
            last_percent = Some(percent);
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    println!("Vertices: {}", mesh.vertex_count());
    println!("Faces:    {}", mesh.face_count());
    if !mesh.is_empty() {
        let (min, max) = mesh.bounding_box();
        println!("Bounds:   {:?} .. {:?}", min, max);
        println!("Center:   {:?}", mesh.center());
    }

    Ok(())
}
