use crate::error::StoreError;

use super::{ArrayData, AttrValue, Document, MemoryStore, Store};

const GRID: i32 = 25;
const FRAMES: usize = 20;

fn sinc(x: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        1.0
    } else {
        let scaled = std::f64::consts::PI * x;
        scaled.sin() / scaled
    }
}

fn radius_grid() -> ArrayData {
    let side = (GRID * 2) as usize;
    let values = (-GRID..GRID)
        .flat_map(|x| (-GRID..GRID).map(move |y| f64::from(x * x + y * y).sqrt()))
        .collect();
    ArrayData {
        shape: vec![side, side],
        values,
    }
}

/// Small hierarchy with 1D, 2D and 3D datasets and a few attributes.
///
/// The image is 50x50 and the movie 20 frames of it, decaying over the frame
/// count rather than a 100 step window, so the JSON file stays a few hundred kilobytes.
pub fn demo_document() -> Result<Document, StoreError> {
    let mut store = MemoryStore::new();
    store.create_group("/group A")?;
    store.create_group("/group B")?;
    store.create_group("/group C")?;

    store.create_dataset(
        "/group B/Simple Data",
        ArrayData::new(vec![25], (0..25).map(f64::from).collect())?,
    )?;

    let radii = radius_grid();
    let image = ArrayData::new(
        radii.shape.clone(),
        radii.values.iter().map(|radius| sinc(*radius)).collect(),
    )?;
    store.create_dataset("/group C/Image Data", image)?;
    store.create_dataset("/group C/R Values", radii.clone())?;

    let side = radii.shape[0];
    let movie = (0..FRAMES)
        .flat_map(|frame| {
            let t = frame as f64;
            radii
                .values
                .iter()
                .map(move |radius| sinc(radius - t) * (-t / FRAMES as f64).exp())
        })
        .collect();
    store.create_dataset(
        "/group C/Movie Data",
        ArrayData::new(vec![FRAMES, side, side], movie)?,
    )?;

    store.write_attribute("/group A", "words", AttrValue::Str("bonobo bonanza".to_owned()))?;
    store.write_attribute("/group A", "number", AttrValue::Int(42))?;
    store.write_attribute("/group C/Image Data", "dataset attr", AttrValue::Float(15.5))?;

    Ok(store.document().clone())
}
