use crate::listings::{GalleryError, ImageGallery, ImageId, ListingId, MAX_PHOTOS_PER_LISTING};

fn paths(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("uploads/p{index}.jpg")).collect()
}

fn primaries(gallery: &ImageGallery) -> Vec<ImageId> {
    gallery
        .images()
        .iter()
        .filter(|image| image.is_primary)
        .map(|image| image.id)
        .collect()
}

#[test]
fn first_photo_of_an_empty_gallery_becomes_primary() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    let added = gallery.attach(paths(3)).expect("attach");

    assert_eq!(added.len(), 3);
    assert_eq!(primaries(&gallery), vec![ImageId(1)]);
    let positions: Vec<_> = gallery.images().iter().map(|image| image.sort_order).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn later_batches_keep_the_existing_primary_and_append() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(2)).expect("attach");
    let added = gallery.attach(paths(2)).expect("attach");

    assert!(added.iter().all(|image| !image.is_primary));
    assert_eq!(added[0].sort_order, 2);
    assert_eq!(primaries(&gallery), vec![ImageId(1)]);
}

#[test]
fn overflowing_batch_is_refused_whole() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(8)).expect("attach");

    let err = gallery.attach(paths(3)).expect_err("over capacity");
    assert_eq!(
        err,
        GalleryError::CapacityExceeded {
            max: MAX_PHOTOS_PER_LISTING,
            existing: 8,
            requested: 3,
        }
    );
    assert_eq!(gallery.len(), 8);

    gallery.attach(paths(2)).expect("exactly at the cap");
    assert_eq!(gallery.len(), MAX_PHOTOS_PER_LISTING);
}

#[test]
fn set_primary_moves_the_flag() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(3)).expect("attach");

    gallery.set_primary(ImageId(3)).expect("known image");
    assert_eq!(primaries(&gallery), vec![ImageId(3)]);
    assert_eq!(gallery.images()[0].id, ImageId(3));

    assert_eq!(
        gallery.set_primary(ImageId(99)),
        Err(GalleryError::UnknownImage(ImageId(99)))
    );
    assert_eq!(primaries(&gallery), vec![ImageId(3)]);
}

#[test]
fn removing_the_primary_promotes_lowest_sort_position() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(3)).expect("attach");
    assert!(gallery.reposition(ImageId(3), -1));

    let removed = gallery.remove(ImageId(1)).expect("remove");
    assert_eq!(removed.new_primary, Some(ImageId(3)));
    assert_eq!(primaries(&gallery), vec![ImageId(3)]);
}

#[test]
fn sort_ties_break_by_id() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(3)).expect("attach");
    gallery.reposition(ImageId(2), 5);
    gallery.reposition(ImageId(3), 5);

    let removed = gallery.remove(ImageId(1)).expect("remove");
    assert_eq!(removed.new_primary, Some(ImageId(2)));
    let order: Vec<_> = gallery.images().iter().map(|image| image.id).collect();
    assert_eq!(order, vec![ImageId(2), ImageId(3)]);
}

#[test]
fn removing_a_secondary_photo_keeps_the_primary() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(2)).expect("attach");

    let removed = gallery.remove(ImageId(2)).expect("remove");
    assert_eq!(removed.new_primary, None);
    assert_eq!(primaries(&gallery), vec![ImageId(1)]);
}

#[test]
fn removing_the_last_photo_leaves_no_primary() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(1)).expect("attach");

    let removed = gallery.remove(ImageId(1)).expect("remove");
    assert_eq!(removed.new_primary, None);
    assert!(gallery.is_empty());
    assert!(gallery.primary().is_none());
}

#[test]
fn reposition_of_unknown_photo_is_a_no_op() {
    let mut gallery = ImageGallery::new(ListingId(1), Vec::new(), 1);
    gallery.attach(paths(1)).expect("attach");
    assert!(!gallery.reposition(ImageId(42), 3));
    assert_eq!(gallery.images()[0].sort_order, 0);
}
