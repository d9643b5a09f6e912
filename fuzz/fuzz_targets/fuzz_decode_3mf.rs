#![no_main]

use libfuzzer_sys::fuzz_target;
use plate_preview::{DecodeConfig, SceneBuilder, SceneConfig};

fuzz_target!(|data: &[u8]| {
    // Whole pipeline: zip -> model XML -> settings/plates -> scene
    if let Ok(model) = plate_preview::decode_3mf(data.to_vec(), &DecodeConfig::default()) {
        for plate in [None, Some(1)] {
            let config = SceneConfig::new().with_selected_plate(plate);
            let _ = SceneBuilder::new(&config).build(&model);
        }
    }
});
