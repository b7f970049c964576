use establishment_core::{
    Category, Establishment, EstablishmentValidationError, Image, Location, LocationFilter,
    Restaurant, RestaurantDetails,
};
use uuid::Uuid;

fn restaurant(id: Uuid) -> Restaurant {
    Establishment {
        id,
        owner_id: "owner".to_string(),
        name: "Navvat".to_string(),
        description: "Uzbek cuisine".to_string(),
        rating: 4.7,
        contact_number: "+998".to_string(),
        licence_url: String::new(),
        website_url: String::new(),
        details: RestaurantDetails {
            opening_hours: "10:00-23:00".to_string(),
        },
        location: Location {
            location_id: Uuid::new_v4(),
            establishment_id: id,
            address: "Navoi St 2".to_string(),
            latitude: 41.32,
            longitude: 69.25,
            country: "Uzbekistan".to_string(),
            city: "Tashkent".to_string(),
            state_province: "Tashkent".to_string(),
            category: Category::Restaurant,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
            deleted_at: None,
        },
        images: vec![Image::new(
            Uuid::new_v4(),
            id,
            Category::Restaurant,
            "hall.jpg",
            1_700_000_000_000,
        )],
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
        deleted_at: None,
    }
}

#[test]
fn restaurant_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let json = serde_json::to_value(restaurant(id)).unwrap();

    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["details"]["opening_hours"], "10:00-23:00");
    assert_eq!(json["location"]["category"], "restaurant");
    assert_eq!(json["images"][0]["image_url"], "hall.jpg");
    assert!(json["deleted_at"].is_null());
}

#[test]
fn category_parsing_is_exact() {
    assert_eq!(Category::parse("Hotel"), None);
    assert_eq!(Category::parse("hostel"), None);
}

#[test]
fn image_owned_by_another_establishment_is_rejected() {
    let id = Uuid::new_v4();
    let mut restaurant = restaurant(id);
    let stranger = Uuid::new_v4();
    restaurant.images[0].establishment_id = stranger;

    assert!(matches!(
        restaurant.validate(),
        Err(EstablishmentValidationError::ImageOwnerMismatch { actual, .. }) if actual == stranger
    ));
}

#[test]
fn non_finite_rating_is_rejected() {
    let mut restaurant = restaurant(Uuid::new_v4());
    restaurant.rating = f64::INFINITY;
    assert!(matches!(
        restaurant.validate(),
        Err(EstablishmentValidationError::NonFiniteRating(_))
    ));
}

#[test]
fn default_location_filter_is_empty() {
    assert_eq!(LocationFilter::default(), LocationFilter::new("", "", ""));
}
