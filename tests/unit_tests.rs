// tests/unit_tests.rs
use burn_calc::classify::{classify, ClassBins, Histogram, HISTOGRAM_EDGES};
use burn_calc::masking::{remove_clouds, CloudMask, PixelQaFlag};
use burn_calc::processing::indices::{IndexCalculator, NDI};
use burn_calc::processing::{calc_dndvi_dnbr, ChangeDirection, ChangePipeline, DeltaIndex, Scene};
use burn_calc::raster::{IndexRaster, Landsat8Band, MaskedRaster};
use burn_calc::render::{
    plot_classified, plot_continuous, plot_dnbr, plot_dndvi, plot_hist_dnbr, plot_hist_dndvi,
    plot_histogram, plot_rgb_cir, FigureOutput, Panel,
};
use burn_calc::utils::fixed_point::{to_fixed_point, FIXED_POINT_NODATA};
use burn_calc::{ClassScheme, Error};
use ndarray::{arr2, Array3};

/// Helper function to create a 7-band scene where every cell repeats the given
/// NIR, RED and SWIR2 values
fn create_test_scene(rows: usize, cols: usize, nir: &[f32], red: &[f32], swir: &[f32]) -> MaskedRaster {
    let mut data = Array3::<f32>::from_elem((7, rows, cols), 0.1);
    for i in 0..rows * cols {
        let (r, c) = (i / cols, i % cols);
        data[[Landsat8Band::Nir.index(), r, c]] = nir[i % nir.len()];
        data[[Landsat8Band::Red.index(), r, c]] = red[i % red.len()];
        data[[Landsat8Band::Swir2.index(), r, c]] = swir[i % swir.len()];
    }
    MaskedRaster::new(data)
}

fn qa_layer(values: &[[u16; 2]; 2]) -> Array3<u16> {
    let flat: Vec<u16> = values.iter().flatten().copied().collect();
    Array3::from_shape_vec((1, 2, 2), flat).unwrap()
}

/// Test NDVI calculation with known values
#[test]
fn test_ndvi_calculation() {
    let test_cases = [
        // NIR, RED, Expected NDVI
        (0.5, 0.25, 0.33333),
        (0.3, 0.3, 0.0),
        (0.5, 0.1, 0.66667),
        (0.2, 0.3, -0.2),
    ];

    let nir: Vec<f32> = test_cases.iter().map(|(n, _, _)| *n).collect();
    let red: Vec<f32> = test_cases.iter().map(|(_, r, _)| *r).collect();
    let scene = create_test_scene(2, 2, &nir, &red, &[0.1]);

    let ndvi = NDI::ndvi().calculate(&scene).unwrap();
    for (i, (_, _, expected)) in test_cases.iter().enumerate() {
        let value = ndvi.get(i / 2, i % 2).unwrap();
        assert!(
            (value - expected).abs() < 1e-4,
            "Expected {}, got {} at index {}",
            expected,
            value,
            i
        );
    }
}

#[test]
fn test_zero_denominator_propagates() {
    let scene = create_test_scene(1, 2, &[0.0, 0.5], &[0.0, -0.5], &[0.1]);
    let ndvi = NDI::ndvi().calculate(&scene).unwrap();

    // 0/0 and x/0 are left to IEEE arithmetic
    assert!(ndvi.get(0, 0).unwrap().is_nan());
    assert!(ndvi.get(0, 1).unwrap().is_infinite());
}

#[test]
fn test_dndvi_scenario() {
    let pre = create_test_scene(1, 1, &[0.5], &[0.1], &[0.1]);
    let post = create_test_scene(1, 1, &[0.2], &[0.3], &[0.1]);

    let (dndvi, _) = calc_dndvi_dnbr(&pre, &post).unwrap();
    let value = dndvi.get(0, 0).unwrap();
    assert!((value - (-0.8667)).abs() < 1e-3, "got {}", value);
    assert_eq!(dndvi.name(), "dNDVI");
}

#[test]
fn test_dnbr_scenario() {
    let pre = create_test_scene(1, 1, &[0.4], &[0.1], &[0.1]);
    let post = create_test_scene(1, 1, &[0.1], &[0.1], &[0.3]);

    let (_, dnbr) = calc_dndvi_dnbr(&pre, &post).unwrap();
    let value = dnbr.get(0, 0).unwrap();
    assert!((value - 1.1).abs() < 1e-4, "got {}", value);
    assert_eq!(dnbr.name(), "dNBR");
}

#[test]
fn test_sign_conventions() {
    // vegetation recovers: NDVI up, NBR up
    let pre = create_test_scene(1, 1, &[0.3], &[0.2], &[0.2]);
    let post = create_test_scene(1, 1, &[0.6], &[0.1], &[0.1]);

    let (dndvi, dnbr) = calc_dndvi_dnbr(&pre, &post).unwrap();
    assert!(dndvi.get(0, 0).unwrap() > 0.0);
    // NBR increased, so pre - post is negative
    assert!(dnbr.get(0, 0).unwrap() < 0.0);

    // burn: NBR drops, dNBR positive
    let (_, burn) = calc_dndvi_dnbr(&post, &pre).unwrap();
    assert!(burn.get(0, 0).unwrap() > 0.0);

    assert_eq!(DeltaIndex::dndvi().direction(), ChangeDirection::PostMinusPre);
    assert_eq!(DeltaIndex::dnbr().direction(), ChangeDirection::PreMinusPost);
}

#[test]
fn test_masks_propagate_from_both_inputs() {
    let pre = create_test_scene(2, 2, &[0.5], &[0.1], &[0.1]);
    let post = create_test_scene(2, 2, &[0.2], &[0.3], &[0.3]);

    let pre = remove_clouds(&pre, &qa_layer(&[[480, 322], [322, 322]]), &[480]).unwrap();
    let post = remove_clouds(&post, &qa_layer(&[[322, 322], [328, 322]]), &[328]).unwrap();

    let (dndvi, dnbr) = calc_dndvi_dnbr(&pre, &post).unwrap();
    for raster in [&dndvi, &dnbr] {
        assert!(raster.is_masked(0, 0));
        assert!(!raster.is_masked(0, 1));
        assert!(raster.is_masked(1, 0));
        assert!(!raster.is_masked(1, 1));
        assert_eq!(raster.unmasked_count(), 2);
    }
}

#[test]
fn test_remove_clouds_masks_matching_cells_on_every_band() {
    let scene = create_test_scene(2, 2, &[0.5], &[0.1], &[0.1]);
    let qa = qa_layer(&[[322, 352], [328, 322]]);
    let masked_values = PixelQaFlag::combined(&[PixelQaFlag::CloudShadow, PixelQaFlag::Cloud]);

    let masked = remove_clouds(&scene, &qa, &masked_values).unwrap();
    for band in Landsat8Band::ALL {
        let mask = masked.band_mask(band).unwrap();
        assert_eq!(mask, arr2(&[[false, true], [true, false]]));
    }
    // data is carried over untouched
    assert_eq!(masked.data(), scene.data());
}

#[test]
fn test_remove_clouds_edge_cases() {
    let scene = create_test_scene(2, 2, &[0.5], &[0.1], &[0.1]);
    let qa = qa_layer(&[[322, 352], [328, 322]]);

    // empty set masks nothing
    let none = remove_clouds(&scene, &qa, &[]).unwrap();
    assert_eq!(none.masked_count(), 0);

    // values absent from the QA layer are inert
    let inert = remove_clouds(&scene, &qa, &[992, 1350]).unwrap();
    assert_eq!(inert.masked_count(), 0);

    // masking twice with the same set excludes the same cells
    let once = remove_clouds(&scene, &qa, &[352]).unwrap();
    let twice = remove_clouds(&once, &qa, &[352]).unwrap();
    assert_eq!(once.mask(), twice.mask());
}

#[test]
fn test_remove_clouds_rejects_mismatched_qa() {
    let scene = create_test_scene(2, 2, &[0.5], &[0.1], &[0.1]);
    let qa = Array3::<u16>::zeros((1, 3, 2));
    assert!(matches!(
        remove_clouds(&scene, &qa, &[1]),
        Err(Error::SizeMismatch { .. })
    ));

    let two_band_qa = Array3::<u16>::zeros((2, 2, 2));
    assert!(matches!(
        CloudMask::from_qa(&two_band_qa, &[1]),
        Err(Error::InvalidParameter { name: "qa", .. })
    ));
}

#[test]
fn test_pair_shape_and_band_checks() {
    let pre = create_test_scene(2, 2, &[0.5], &[0.1], &[0.1]);
    let post = create_test_scene(3, 2, &[0.5], &[0.1], &[0.1]);
    assert!(matches!(
        calc_dndvi_dnbr(&pre, &post),
        Err(Error::SizeMismatch { .. })
    ));

    let short = MaskedRaster::new(Array3::from_elem((5, 2, 2), 0.2));
    assert!(matches!(
        calc_dndvi_dnbr(&short, &short),
        Err(Error::MissingBand { available: 5, .. })
    ));
}

/// Test that required_bands and names match each calculator
#[test]
fn test_required_bands_and_names() {
    assert_eq!(NDI::ndvi().required_bands(), 5);
    assert_eq!(NDI::ndvi().name(), "NDVI");
    assert_eq!(NDI::nbr().required_bands(), 7);
    assert_eq!(NDI::nbr().name(), "NBR");

    let custom = NDI::new(Landsat8Band::Green, Landsat8Band::Nir, Some("NDWI".to_string()));
    assert_eq!(custom.name(), "NDWI");
    assert_eq!(custom.bands(), (Landsat8Band::Green, Landsat8Band::Nir));
}

#[test]
fn test_classification_boundary_convention() {
    let bins = ClassBins::new(vec![-0.99, -0.5, -0.2, 0.0, 0.2, 0.5, 1.0]).unwrap();
    assert_eq!(bins.digitize(0.3), 5);

    let raster = IndexRaster::unmasked("dNBR", arr2(&[[0.3, -0.2], [0.5, -2.0]]));
    let classes = classify(&raster, &bins);
    assert_eq!(classes.classes(), &arr2(&[[5, 3], [6, 0]]));
    assert_eq!(classes.present_classes(), vec![0, 3, 5, 6]);
}

#[test]
fn test_histogram_counts_sum_to_unmasked_cells() {
    let data = arr2(&[[-0.9, -0.3, 0.1, 0.4], [0.9, 0.05, -0.6, 0.25]]);
    let mask = arr2(&[[false, false, true, false], [false, false, false, true]]);
    let raster = IndexRaster::new("dNDVI", data, mask).unwrap();

    let hist = Histogram::compute(&raster, &HISTOGRAM_EDGES).unwrap();
    assert_eq!(hist.total(), raster.unmasked_count());
    assert_eq!(hist.counts(), &[2, 1, 0, 1, 1, 1]);
    assert_eq!(hist.nan_count(), 0);
}

#[test]
fn test_pipeline_runs_without_figures() {
    let pre = create_test_scene(2, 2, &[0.4], &[0.1], &[0.1]);
    let post = create_test_scene(2, 2, &[0.1], &[0.1], &[0.3]);
    let qa = qa_layer(&[[322, 322], [322, 480]]);

    let pipeline = ChangePipeline::new(vec![480]).without_figures();
    let products = pipeline
        .run(
            &Scene::new(&pre, "03-02-2017").with_qa(&qa),
            &Scene::new(&post, "06-25-2018"),
        )
        .unwrap();

    assert_eq!(products.label, "06-25-2018 - 03-02-2017");
    assert!(products.figures.is_empty());
    assert!(products.dnbr.is_masked(1, 1));
    assert!((products.dnbr.get(0, 0).unwrap() - 1.1).abs() < 1e-4);
}

#[test]
fn test_pipeline_saves_figures() {
    let dir = tempfile::tempdir().unwrap();
    let pre = create_test_scene(3, 3, &[0.4, 0.5], &[0.1], &[0.1]);
    let post = create_test_scene(3, 3, &[0.1, 0.2], &[0.1], &[0.3]);

    let pipeline = ChangePipeline::new(Vec::new()).with_output(FigureOutput::new(dir.path()));
    let products = pipeline
        .run(&Scene::new(&pre, "pre"), &Scene::new(&post, "post"))
        .unwrap();

    assert_eq!(products.figures.len(), 6);
    for name in [
        "landsat_rgb_cir_pre.png",
        "landsat_rgb_cir_post.png",
        "landsat_dNDVI_post - pre.png",
        "landsat_dNBR_post - pre.png",
        "landsat_hist_dNDVI_post - pre.png",
        "landsat_hist_dNBR_post - pre.png",
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }
}

#[test]
fn test_plot_wrappers_write_deterministic_files() {
    let dir = tempfile::tempdir().unwrap();
    let output = FigureOutput::new(dir.path());
    let pre = create_test_scene(4, 4, &[0.4, 0.5, 0.3], &[0.1], &[0.1, 0.2]);
    let post = create_test_scene(4, 4, &[0.1, 0.3], &[0.1], &[0.3]);
    let (dndvi, dnbr) = calc_dndvi_dnbr(&pre, &post).unwrap();

    let figure = plot_dndvi(&dndvi, "06-25-2018", &dndvi, "11-16-2018", Some(&output)).unwrap();
    let path = dir.path().join("landsat_dNDVI_06-25-2018_11-16-2018.png");
    assert!(path.exists());
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (figure.width(), figure.height()));

    plot_dnbr(&dnbr, "a", &dnbr, "b", &ClassScheme::dnbr_severity(), Some(&output)).unwrap();
    assert!(dir.path().join("landsat_dNBR_a_b.png").exists());

    plot_hist_dnbr(&dnbr, "a", &dnbr, "b", Some(&output)).unwrap();
    assert!(dir.path().join("landsat_hist_dNBR_ab.png").exists());

    // not saved without an output
    plot_hist_dnbr(&dnbr, "c", &dnbr, "d", None).unwrap();
    assert!(!dir.path().join("landsat_hist_dNBR_cd.png").exists());
}

/// Every figure renders in the default build, where no font backend is available
#[test]
fn test_every_figure_kind_renders() {
    let pre = create_test_scene(5, 5, &[0.4, 0.5, 0.3], &[0.1, 0.2], &[0.1, 0.3]);
    let post = create_test_scene(5, 5, &[0.1, 0.3], &[0.1], &[0.3, 0.2]);
    let (dndvi, dnbr) = calc_dndvi_dnbr(&pre, &post).unwrap();
    let scheme = ClassScheme::dnbr_severity();

    let figures = vec![
        plot_rgb_cir(&pre, "pre", None).unwrap(),
        plot_continuous(&[Panel::new(&dndvi, "a")], None).unwrap(),
        plot_classified(&[Panel::new(&dnbr, "a")], &scheme, None).unwrap(),
        plot_histogram(&[Panel::new(&dnbr, "a")], &HISTOGRAM_EDGES, None).unwrap(),
        plot_dndvi(&dndvi, "a", &dndvi, "b", None).unwrap(),
        plot_dnbr(&dnbr, "a", &dnbr, "b", &scheme, None).unwrap(),
        plot_hist_dndvi(&dndvi, "a", &dndvi, "b", None).unwrap(),
        plot_hist_dnbr(&dnbr, "a", &dnbr, "b", None).unwrap(),
    ];

    for figure in &figures {
        assert_eq!(
            figure.pixels().len(),
            (figure.width() * figure.height() * 3) as usize
        );
        assert!(
            figure.pixels().iter().any(|&p| p != 255),
            "{:?} drew nothing",
            figure.kind()
        );
    }
}

#[test]
fn test_rgb_cir_missing_band_is_an_error() {
    let short = MaskedRaster::new(Array3::from_elem((4, 3, 3), 0.2));
    assert!(matches!(
        plot_rgb_cir(&short, "x", None),
        Err(Error::MissingBand { .. })
    ));
}

/// Test fixed-point encoding of valid, non-finite and masked change values
#[test]
fn test_fixed_point_encoding() {
    let raster = IndexRaster::new(
        "dNBR",
        arr2(&[[-1.0, 1.1, f32::INFINITY], [f32::NEG_INFINITY, f32::NAN, 0.27]]),
        arr2(&[[false, false, false], [false, false, true]]),
    )
    .unwrap();

    let encoded = to_fixed_point(&raster, 10000, FIXED_POINT_NODATA).unwrap();
    assert_eq!(
        encoded,
        vec![
            -10000,
            11000,
            FIXED_POINT_NODATA,
            FIXED_POINT_NODATA,
            FIXED_POINT_NODATA,
            FIXED_POINT_NODATA
        ]
    );

    assert!(matches!(
        to_fixed_point(&raster, 0, FIXED_POINT_NODATA),
        Err(Error::InvalidParameter { name: "scale_factor", .. })
    ));
}
