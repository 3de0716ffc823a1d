//! Straight-line travel estimation. Pure functions, no failure modes.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Roads are longer than great circles.
const ROAD_FACTOR: f64 = 1.25;

/// Approximate urban/rural mix.
const AVG_SPEED_KMH: f64 = 50.0;

/// Haversine great-circle distance between two lat/lng points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Estimated travel time in whole minutes between two points, never below 1.
pub fn estimate_travel_minutes(
    origin_lat: f64,
    origin_lng: f64,
    dest_lat: f64,
    dest_lng: f64,
) -> u32 {
    let distance_km = haversine_km(origin_lat, origin_lng, dest_lat, dest_lng) * ROAD_FACTOR;
    let minutes = (distance_km / AVG_SPEED_KMH * 60.0).round() as u32;
    minutes.max(1)
}
