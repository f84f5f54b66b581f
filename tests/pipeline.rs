use astral_nft_tools::audit::{audit_metadata_dir, split_ipfs_uri};
use astral_nft_tools::config::Config;
use astral_nft_tools::metadata::generate_metadata;
use astral_nft_tools::rename::rename_images;
use astral_nft_tools::upload::save_cid;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;

#[test]
fn renamed_images_match_generated_image_uris() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.images.directory = root.path().join("images");
    cfg.metadata.output_dir = root.path().join("metadata");
    cfg.pinning.cid_file = root.path().join("image_folder_cid.txt");
    cfg.metadata.count = 3;

    fs::create_dir(&cfg.images.directory).unwrap();
    for name in ["IMG_0003.jpg", "img_0001.jpg", "IMG_0002.JPG"] {
        fs::write(cfg.images.directory.join(name), name).unwrap();
    }

    assert_eq!(rename_images(&cfg.images.directory, &cfg.images.prefix).unwrap(), 3);

    // upload 済みの想定で CID ファイルだけ用意する
    save_cid(&cfg.pinning.cid_file, "bafypipeline").unwrap();
    let cid = cfg.resolve_cid().unwrap();

    let records = generate_metadata(&cfg, &cid, &mut StdRng::seed_from_u64(2024)).unwrap();
    for record in &records {
        let (record_cid, path) = split_ipfs_uri(&record.image).unwrap();
        assert_eq!(record_cid, "bafypipeline");
        assert!(cfg.images.directory.join(path).is_file(), "{}", path);
    }
    assert_eq!(
        fs::read_to_string(cfg.images.directory.join("Astral Pack Legends #001.jpg")).unwrap(),
        "img_0001.jpg"
    );

    let report = audit_metadata_dir(&cfg.metadata.output_dir, Some(3), Some(&cid)).unwrap();
    assert!(report.is_ok(), "{:?}", report);
}

#[test]
fn unseeded_runs_differ() {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.metadata.count = 40;

    cfg.metadata.output_dir = root.path().join("a");
    let a = generate_metadata(&cfg, "cid", &mut StdRng::from_entropy()).unwrap();
    cfg.metadata.output_dir = root.path().join("b");
    let b = generate_metadata(&cfg, "cid", &mut StdRng::from_entropy()).unwrap();

    let da: Vec<&str> = a.iter().map(|r| r.description.as_str()).collect();
    let db: Vec<&str> = b.iter().map(|r| r.description.as_str()).collect();
    assert_ne!(da, db);
}
