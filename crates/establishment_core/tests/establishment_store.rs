use establishment_core::db::open_db_in_memory;
use establishment_core::repo::StatementPhase;
use establishment_core::{
    Attraction, AttractionDetails, Category, Deadline, DeleteMode, Establishment,
    EstablishmentDetails, EstablishmentRepository, Hotel, HotelDetails, Image, Location,
    LocationFilter, Page, RepoError, Restaurant, RestaurantDetails, SqliteAttractionRepository,
    SqliteHotelRepository, SqliteRestaurantRepository, StoreOptions, WriteMode,
};
use rusqlite::Connection;
use std::time::{Duration, Instant};
use uuid::Uuid;

const NOW_MS: i64 = 1_700_000_000_000;

fn establishment<K: EstablishmentDetails>(
    details: K,
    name: &str,
    rating: f64,
    (country, city, state_province): (&str, &str, &str),
    image_urls: &[&str],
) -> Establishment<K> {
    let id = Uuid::new_v4();
    Establishment {
        id,
        owner_id: "owner-1".to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        rating,
        contact_number: "+998 71 000 00 00".to_string(),
        licence_url: "https://licence.example/1".to_string(),
        website_url: "https://example.uz".to_string(),
        details,
        location: Location {
            location_id: Uuid::new_v4(),
            establishment_id: id,
            address: "1 Amir Temur Ave".to_string(),
            latitude: 41.311,
            longitude: 69.279,
            country: country.to_string(),
            city: city.to_string(),
            state_province: state_province.to_string(),
            category: K::CATEGORY,
            created_at: NOW_MS,
            updated_at: NOW_MS,
            deleted_at: None,
        },
        images: image_urls
            .iter()
            .map(|url| Image::new(Uuid::new_v4(), id, K::CATEGORY, *url, NOW_MS))
            .collect(),
        created_at: NOW_MS,
        updated_at: NOW_MS,
        deleted_at: None,
    }
}

fn hotel(name: &str, rating: f64, place: (&str, &str, &str)) -> Hotel {
    establishment(HotelDetails, name, rating, place, &["front.jpg", "lobby.jpg"])
}

const TASHKENT: (&str, &str, &str) = ("Uzbekistan", "Tashkent", "Tashkent");
const SAMARKAND: (&str, &str, &str) = ("Uzbekistan", "Samarkand", "Samarkand");
const ALMATY: (&str, &str, &str) = ("Kazakhstan", "Almaty", "Almaty Region");

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn expired() -> Deadline {
    let past = Instant::now()
        .checked_sub(Duration::from_millis(1))
        .unwrap_or_else(Instant::now);
    Deadline::at(past)
}

#[test]
fn create_and_get_roundtrip_for_every_kind() {
    let conn = open_db_in_memory().unwrap();

    let attractions = SqliteAttractionRepository::try_new(&conn).unwrap();
    let attraction: Attraction =
        establishment(AttractionDetails, "Chorsu Bazaar", 4.6, TASHKENT, &["dome.jpg"]);
    let created = attractions.create(&attraction, Deadline::none()).unwrap();
    assert_eq!(created, attraction);
    assert_eq!(attractions.get(attraction.id, Deadline::none()).unwrap(), attraction);

    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let grand = hotel("Grand Tashkent", 4.2, TASHKENT);
    hotels.create(&grand, Deadline::none()).unwrap();
    assert_eq!(hotels.get(grand.id, Deadline::none()).unwrap(), grand);

    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();
    let plov: Restaurant = establishment(
        RestaurantDetails {
            opening_hours: "09:00-23:00".to_string(),
        },
        "Besh Qozon",
        4.9,
        TASHKENT,
        &[],
    );
    restaurants.create(&plov, Deadline::none()).unwrap();
    let loaded = restaurants.get(plov.id, Deadline::none()).unwrap();
    assert_eq!(loaded.details.opening_hours, "09:00-23:00");
    assert!(loaded.images.is_empty());
    assert_eq!(loaded, plov);
}

#[test]
fn create_writes_satellites_under_the_store_kind() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let mut hotel = hotel("Hyatt Regency", 4.7, TASHKENT);
    hotel.location.category = Category::Restaurant;
    hotel.images[0].category = Category::Attraction;

    let created = hotels.create(&hotel, Deadline::none()).unwrap();
    assert_eq!(created.location.category, Category::Hotel);
    assert!(created.images.iter().all(|image| image.category == Category::Hotel));

    let loaded = hotels.get(hotel.id, Deadline::none()).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn images_come_back_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let hotel = establishment(
        HotelDetails,
        "Lotte City",
        4.4,
        TASHKENT,
        &["c.jpg", "a.jpg", "b.jpg"],
    );
    hotels.create(&hotel, Deadline::none()).unwrap();

    let urls: Vec<String> = hotels
        .get(hotel.id, Deadline::none())
        .unwrap()
        .images
        .into_iter()
        .map(|image| image.image_url)
        .collect();
    assert_eq!(urls, vec!["c.jpg", "a.jpg", "b.jpg"]);
}

#[test]
fn invalid_aggregate_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let mut hotel = hotel("  ", 4.0, TASHKENT);
    let err = hotels.create(&hotel, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    hotel.name = "Ok".to_string();
    hotel.location.latitude = 120.0;
    let err = hotels.create(&hotel, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    assert_eq!(count_rows(&conn, "location_table"), 0);
    assert_eq!(count_rows(&conn, "hotel_table"), 0);
}

#[test]
fn get_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let id = Uuid::new_v4();
    let err = hotels.get(id, Deadline::none()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            category: Category::Hotel,
            id: missing
        } if missing == id
    ));
    assert!(err.is_not_found());
}

#[test]
fn get_without_active_location_is_location_not_found() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let hotel = hotel("Wyndham", 4.1, TASHKENT);
    hotels.create(&hotel, Deadline::none()).unwrap();

    conn.execute(
        "UPDATE location_table SET deleted_at = 1 WHERE establishment_id = ?1;",
        [hotel.id.to_string()],
    )
    .unwrap();

    let err = hotels.get(hotel.id, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::LocationNotFound { .. }));

    let err = hotels.list(Page::all(), Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::LocationNotFound { .. }));
}

#[test]
fn soft_deleted_images_are_not_returned() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let hotel = hotel("Ichan Qal'a", 4.0, SAMARKAND);
    hotels.create(&hotel, Deadline::none()).unwrap();

    conn.execute(
        "UPDATE image_table SET deleted_at = 1 WHERE image_id = ?1;",
        [hotel.images[0].image_id.to_string()],
    )
    .unwrap();

    let loaded = hotels.get(hotel.id, Deadline::none()).unwrap();
    assert_eq!(loaded.images, vec![hotel.images[1].clone()]);

    let listed = hotels.list(Page::all(), Deadline::none()).unwrap();
    assert_eq!(listed.items[0].images.len(), 1);
}

#[test]
fn list_pages_by_rating_and_counts_all_active_rows() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    for (name, rating) in [("A", 3.0), ("B", 5.0), ("C", 4.0), ("D", 1.0), ("E", 2.0)] {
        hotels.create(&hotel(name, rating, TASHKENT), Deadline::none()).unwrap();
    }

    let page = hotels.list(Page::new(1, 2), Deadline::none()).unwrap();
    let names: Vec<&str> = page.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A"]);
    assert_eq!(page.total, 5);

    let everything = hotels.list(Page::all(), Deadline::none()).unwrap();
    assert_eq!(everything.items.len(), 5);
    assert_eq!(everything.items[0].name, "B");
    assert_eq!(everything.total, 5);

    let past_end = hotels.list(Page::new(10, 2), Deadline::none()).unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 5);
}

#[test]
fn equal_ratings_are_ordered_by_id() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let mut ids = Vec::new();
    for name in ["X", "Y", "Z"] {
        let hotel = hotel(name, 4.0, TASHKENT);
        ids.push(hotel.id.to_string());
        hotels.create(&hotel, Deadline::none()).unwrap();
    }
    ids.sort();

    let listed: Vec<String> = hotels
        .list(Page::all(), Deadline::none())
        .unwrap()
        .items
        .iter()
        .map(|item| item.id.to_string())
        .collect();
    assert_eq!(listed, ids);
}

#[test]
fn soft_delete_hides_row_from_every_read() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let kept = hotel("Grand Kept", 4.0, TASHKENT);
    let gone = hotel("Grand Gone", 5.0, TASHKENT);
    hotels.create(&kept, Deadline::none()).unwrap();
    hotels.create(&gone, Deadline::none()).unwrap();

    hotels.delete(gone.id, Deadline::none()).unwrap();

    assert!(hotels.get(gone.id, Deadline::none()).unwrap_err().is_not_found());

    let listed = hotels.list(Page::all(), Deadline::none()).unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, kept.id);

    let by_location = hotels
        .list_by_location(Page::all(), &LocationFilter::default(), Deadline::none())
        .unwrap();
    assert_eq!(by_location.total, 1);

    let by_name = hotels.find_by_name("grand", Deadline::none()).unwrap();
    assert_eq!(by_name.total, 1);
    assert_eq!(by_name.items[0].id, kept.id);

    let deleted_at: Option<i64> = conn
        .query_row(
            "SELECT deleted_at FROM hotel_table WHERE hotel_id = ?1;",
            [gone.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert!(deleted_at.is_some());
}

#[test]
fn deleting_twice_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let hotel = hotel("Twice", 3.0, TASHKENT);
    hotels.create(&hotel, Deadline::none()).unwrap();

    hotels.delete(hotel.id, Deadline::none()).unwrap();
    let err = hotels.delete(hotel.id, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    let err = hotels.delete(Uuid::new_v4(), Deadline::none()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn hard_delete_removes_entity_and_keeps_satellites() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::with_options(
        &conn,
        StoreOptions {
            delete_mode: DeleteMode::Hard,
            ..StoreOptions::default()
        },
    )
    .unwrap();
    let hotel = hotel("Short Stay", 3.0, TASHKENT);
    hotels.create(&hotel, Deadline::none()).unwrap();

    hotels.delete(hotel.id, Deadline::none()).unwrap();

    assert_eq!(count_rows(&conn, "hotel_table"), 0);
    assert_eq!(count_rows(&conn, "location_table"), 1);
    assert_eq!(count_rows(&conn, "image_table"), 2);
    assert!(hotels.delete(hotel.id, Deadline::none()).unwrap_err().is_not_found());
}

#[test]
fn update_rewrites_entity_and_location_but_not_images() {
    let conn = open_db_in_memory().unwrap();
    let restaurants = SqliteRestaurantRepository::try_new(&conn).unwrap();
    let original: Restaurant = establishment(
        RestaurantDetails {
            opening_hours: "10:00-22:00".to_string(),
        },
        "Caravan",
        4.0,
        TASHKENT,
        &["hall.jpg"],
    );
    restaurants.create(&original, Deadline::none()).unwrap();

    let mut changed = original.clone();
    changed.name = "Caravan Garden".to_string();
    changed.rating = 4.8;
    changed.details.opening_hours = "08:00-00:00".to_string();
    changed.location.city = "Samarkand".to_string();
    changed.location.address = "12 Registan St".to_string();
    changed.images = vec![Image::new(
        Uuid::new_v4(),
        original.id,
        Category::Restaurant,
        "ignored.jpg",
        NOW_MS,
    )];

    let updated = restaurants.update(&changed, Deadline::none()).unwrap();
    assert_eq!(updated.name, "Caravan Garden");
    assert_eq!(updated.rating, 4.8);
    assert_eq!(updated.details.opening_hours, "08:00-00:00");
    assert_eq!(updated.location.city, "Samarkand");
    assert_eq!(updated.location.address, "12 Registan St");
    assert_eq!(updated.images, original.images);
    assert!(updated.updated_at >= original.updated_at);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(count_rows(&conn, "image_table"), 1);
}

#[test]
fn update_missing_or_deleted_row_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let unknown = hotel("Nowhere", 2.0, TASHKENT);
    let err = hotels.update(&unknown, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    let hotel = hotel("Deleted", 2.0, TASHKENT);
    hotels.create(&hotel, Deadline::none()).unwrap();
    hotels.delete(hotel.id, Deadline::none()).unwrap();
    let err = hotels.update(&hotel, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn atomic_update_without_location_rolls_back_entity_change() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let original = hotel("Before", 3.0, TASHKENT);
    hotels.create(&original, Deadline::none()).unwrap();
    conn.execute(
        "DELETE FROM location_table WHERE establishment_id = ?1;",
        [original.id.to_string()],
    )
    .unwrap();

    let mut changed = original.clone();
    changed.name = "After".to_string();
    let err = hotels.update(&changed, Deadline::none()).unwrap_err();
    assert!(matches!(err, RepoError::LocationNotFound { .. }));

    let name: String = conn
        .query_row(
            "SELECT hotel_name FROM hotel_table WHERE hotel_id = ?1;",
            [original.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "Before");
}

#[test]
fn list_by_location_matches_substrings_and_counts_every_match() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    for (name, rating, place) in [
        ("Tash One", 4.0, TASHKENT),
        ("Tash Two", 5.0, TASHKENT),
        ("Tash Three", 3.0, TASHKENT),
        ("Sam", 4.5, SAMARKAND),
        ("Alm", 4.9, ALMATY),
    ] {
        hotels.create(&hotel(name, rating, place), Deadline::none()).unwrap();
    }

    let filter = LocationFilter::new("Uzbek", "Tash", "");
    let page = hotels
        .list_by_location(Page::new(0, 2), &filter, Deadline::none())
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Tash Two", "Tash One"]);
    assert_eq!(page.total, 3);

    let rest = hotels
        .list_by_location(Page::new(2, 2), &filter, Deadline::none())
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].name, "Tash Three");
    assert_eq!(rest.total, 3);

    let uzbekistan = hotels
        .list_by_location(
            Page::all(),
            &LocationFilter::new("Uzbekistan", "", ""),
            Deadline::none(),
        )
        .unwrap();
    assert_eq!(uzbekistan.items.len(), 4);
    assert_eq!(uzbekistan.total, 4);
}

#[test]
fn list_by_location_is_case_sensitive_and_literal() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    hotels.create(&hotel("Only", 4.0, TASHKENT), Deadline::none()).unwrap();

    let lower = hotels
        .list_by_location(
            Page::all(),
            &LocationFilter::new("uzbekistan", "", ""),
            Deadline::none(),
        )
        .unwrap();
    assert!(lower.items.is_empty());
    assert_eq!(lower.total, 0);

    let wildcard = hotels
        .list_by_location(
            Page::all(),
            &LocationFilter::new("%", "_", ""),
            Deadline::none(),
        )
        .unwrap();
    assert_eq!(wildcard.total, 0);
}

#[test]
fn list_by_location_ignores_other_kinds() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();
    let attractions = SqliteAttractionRepository::try_new(&conn).unwrap();

    hotels.create(&hotel("Hotel", 4.0, TASHKENT), Deadline::none()).unwrap();
    attractions
        .create(
            &establishment(AttractionDetails, "Tower", 4.0, TASHKENT, &[]),
            Deadline::none(),
        )
        .unwrap();

    let listed = hotels
        .list_by_location(Page::all(), &LocationFilter::default(), Deadline::none())
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].name, "Hotel");
}

#[test]
fn find_by_name_ignores_case_and_counts_matches() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    for (name, rating) in [("Grand Hotel", 4.0), ("THE GRAND", 4.5), ("Park Inn", 4.9)] {
        hotels.create(&hotel(name, rating, TASHKENT), Deadline::none()).unwrap();
    }

    let found = hotels.find_by_name("grand", Deadline::none()).unwrap();
    let names: Vec<&str> = found.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["THE GRAND", "Grand Hotel"]);
    assert_eq!(found.total, 2);

    let none = hotels.find_by_name("hilton", Deadline::none()).unwrap();
    assert!(none.items.is_empty());
    assert_eq!(none.total, 0);

    let all = hotels.find_by_name("", Deadline::none()).unwrap();
    assert_eq!(all.total, 3);
}

#[test]
fn atomic_create_leaves_nothing_after_a_failed_step() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::try_new(&conn).unwrap();

    let mut hotel = hotel("Duplicate Images", 4.0, TASHKENT);
    hotel.images[1].image_id = hotel.images[0].image_id;

    let err = hotels.create(&hotel, Deadline::none()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Persistence {
            step: "insert image",
            phase: StatementPhase::Execute,
            ..
        }
    ));
    assert_eq!(count_rows(&conn, "location_table"), 0);
    assert_eq!(count_rows(&conn, "image_table"), 0);
    assert_eq!(count_rows(&conn, "hotel_table"), 0);
}

#[test]
fn sequential_create_keeps_rows_written_before_the_failure() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::with_options(
        &conn,
        StoreOptions {
            write_mode: WriteMode::Sequential,
            ..StoreOptions::default()
        },
    )
    .unwrap();

    let mut hotel = hotel("Duplicate Images", 4.0, TASHKENT);
    hotel.images[1].image_id = hotel.images[0].image_id;

    let err = hotels.create(&hotel, Deadline::none()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Persistence {
            step: "insert image",
            ..
        }
    ));
    assert_eq!(count_rows(&conn, "location_table"), 1);
    assert_eq!(count_rows(&conn, "image_table"), 1);
    assert_eq!(count_rows(&conn, "hotel_table"), 0);
}

#[test]
fn retried_sequential_create_is_listed_once_by_location() {
    let conn = open_db_in_memory().unwrap();
    let hotels = SqliteHotelRepository::with_options(
        &conn,
        StoreOptions {
            write_mode: WriteMode::Sequential,
            ..StoreOptions::default()
        },
    )
    .unwrap();

    let mut hotel = hotel("Retried", 4.0, TASHKENT);
    hotel.images[1].image_id = hotel.images[0].image_id;
    hotels.create(&hotel, Deadline::none()).unwrap_err();

    hotel.location.location_id = Uuid::new_v4();
    for image in &mut hotel.images {
        image.image_id = Uuid::new_v4();
    }
    hotels.create(&hotel, Deadline::none()).unwrap();
    assert_eq!(count_rows(&conn, "location_table"), 2);

    let loaded = hotels.get(hotel.id, Deadline::none()).unwrap();
    assert_eq!(hotels.list(Page::all(), Deadline::none()).unwrap().total, 1);

    let listing = hotels
        .list_by_location(
            Page::all(),
            &LocationFilter::new("Uzbekistan", "Tashkent", ""),
            Deadline::none(),
        )
        .unwrap();
    assert_eq!(listing.total, 1);
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0], loaded);
}

#[test]
fn expired_deadline_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let atomic = SqliteHotelRepository::try_new(&conn).unwrap();
    let sequential = SqliteHotelRepository::with_options(
        &conn,
        StoreOptions {
            write_mode: WriteMode::Sequential,
            ..StoreOptions::default()
        },
    )
    .unwrap();
    let hotel = hotel("Late", 4.0, TASHKENT);

    let err = atomic.create(&hotel, expired()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DeadlineExceeded {
            step: "begin transaction"
        }
    ));

    let err = sequential.create(&hotel, expired()).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DeadlineExceeded {
            step: "insert location"
        }
    ));

    assert_eq!(count_rows(&conn, "location_table"), 0);
    assert_eq!(count_rows(&conn, "hotel_table"), 0);

    let err = atomic.list(Page::all(), expired()).unwrap_err();
    assert!(matches!(err, RepoError::DeadlineExceeded { .. }));
    assert!(!err.is_not_found());
}
