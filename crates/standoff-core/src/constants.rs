//! Simulation constants and tuning parameters.
//!
//! These are the server-side radar/range/timing constants spec.md §9 says
//! govern authoritatively (clients render a conservative estimate of their
//! own, but that's outside this core). Per-scenario/catalog values (DEFCON
//! timings, hack curves) live in `standoff-catalog` instead, since they vary
//! by configuration document rather than being fixed across all sessions.

/// Authoritative tick rate (Hz, §4.3).
pub const TICK_RATE: u32 = 10;

/// Milliseconds per tick at 1x game speed.
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Allowed game speed multipliers (§4.3).
pub const GAME_SPEEDS: [u32; 3] = [1, 2, 5];

/// Earth's mean radius, used for all great-circle math (meters).
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

// --- DEFCON default timings (overridable per session config) ---

/// Default seconds spent at DEFCON 5 (placement).
pub const DEFAULT_DEFCON5_SECS: u64 = 90;
/// Default seconds spent at each of DEFCON 4/3/2 (escalation).
pub const DEFAULT_DEFCON_ESCALATION_SECS: u64 = 60;
/// Default seconds before the DEFCON 1 timer expires and the session ends (§4.11).
pub const DEFAULT_DEFCON1_SECS: u64 = 300;

// --- Buildings ---

/// Maximum silos a single player may place (§3 "capped by config").
pub const MAX_SILOS_PER_PLAYER: u32 = 6;
/// Maximum radars a single player may place.
pub const MAX_RADARS_PER_PLAYER: u32 = 4;
/// Maximum airfields a single player may place.
pub const MAX_AIRFIELDS_PER_PLAYER: u32 = 2;
/// Maximum satellite facilities a single player may place.
pub const MAX_SATELLITE_FACILITIES_PER_PLAYER: u32 = 1;

/// Starting missile ammo per newly placed silo.
pub const STARTING_MISSILE_AMMO: u32 = 6;
/// Starting interceptor ammo per newly placed silo.
pub const STARTING_INTERCEPTOR_AMMO: u32 = 10;

// --- Ballistics ---

/// Minimum ICBM flight duration so trails remain visible on short hops (ms).
pub const MIN_FLIGHT_DURATION_MS: u64 = 8_000;
/// Nominal ICBM ground speed used to derive flight duration (km/h equivalent,
/// expressed directly as km per simulated second for convenience).
pub const ICBM_SPEED_KM_PER_SEC: f64 = 7.0;

/// Nominal interceptor ground speed used for rail feasibility search.
pub const INTERCEPTOR_SPEED_KM_PER_SEC: f64 = 9.0;
/// Fuel budget loaded into a freshly launched interceptor (seconds).
pub const INTERCEPTOR_FUEL_SECONDS_DEFAULT: f64 = 600.0;

/// Boost-phase cap (ms) and re-entry cap (ms), each further capped at 45% of
/// total flight duration (§4.5).
pub const BOOST_PHASE_CAP_MS: u64 = 15_000;
pub const REENTRY_PHASE_CAP_MS: u64 = 8_000;
pub const PHASE_FRACTION_CAP: f64 = 0.45;

/// Apex altitude scaling: meters per kilometer of great-circle distance,
/// clamped to `APEX_ALTITUDE_MAX_M`.
pub const APEX_ALTITUDE_PER_KM: f64 = 250.0;
pub const APEX_ALTITUDE_MAX_M: f64 = 1_200_000.0;

/// Interceptor rail search window — progress bounds along the ICBM path
/// within which an intercept point may be placed (§4.5).
pub const INTERCEPT_PROGRESS_MIN: f64 = 0.15;
pub const INTERCEPT_PROGRESS_MAX: f64 = 0.85;
/// Number of candidate points sampled across the search window.
pub const INTERCEPT_SEARCH_SAMPLES: u32 = 64;

/// Interceptor guidance grace period after losing all tracking radars (ms).
pub const GUIDANCE_GRACE_MS: u64 = 2_000;

/// Window over which a satellite's future ground track is sampled when
/// searching for an interceptor rail against it (§4.6).
pub const SATELLITE_INTERCEPT_WINDOW_MS: u64 = 180_000;

/// Maximum degrees of id-derived jitter applied to a launch position
/// reported to a recipient without direct track on the missile (§4.8).
pub const LAUNCH_DETECTION_JITTER_DEG: f64 = 3.0;

/// Close-proximity radius for a successful intercept (kilometers, 3D).
pub const INTERCEPT_PROXIMITY_KM: f64 = 15.0;

/// Hit-probability phase bases (§4.5).
pub const PK_BASE_BOOST: f64 = 0.40;
pub const PK_BASE_MIDCOURSE: f64 = 0.70;
pub const PK_BASE_REENTRY: f64 = 0.45;

/// Bonus per extra tracking radar beyond the first, capped.
pub const PK_PER_RADAR_BONUS: f64 = 0.05;
pub const PK_MAX_RADAR_BONUS: f64 = 0.15;
/// Fuel-fraction threshold below which a penalty applies.
pub const PK_LOW_FUEL_THRESHOLD: f64 = 0.15;
pub const PK_LOW_FUEL_PENALTY: f64 = 0.20;
/// Symmetric random variance applied to the roll.
pub const PK_RANDOM_VARIANCE: f64 = 0.05;
pub const PK_MIN: f64 = 0.05;
pub const PK_MAX: f64 = 0.95;

/// Ticks an interceptor coasts after a miss before being marked crashed.
pub const MISS_COAST_TICKS: u32 = 3;

// --- Damage ---

/// Angular blast radius around an ICBM detonation point (kilometers).
pub const BLAST_RADIUS_KM: f64 = 40.0;
/// Fraction of affected population lost at ground zero (linear falloff to 0 at radius).
pub const DAMAGE_COEFFICIENT: f64 = 0.9;
/// Score awarded per population killed.
pub const SCORE_PER_KILL: i64 = 1;
/// Score awarded for destroying an enemy building.
pub const SCORE_PER_BUILDING_DESTROYED: i64 = 25;

// --- Satellites ---

/// Default orbital period for a newly launched satellite (ms).
pub const DEFAULT_ORBITAL_PERIOD_MS: u64 = 90 * 60 * 1000;
/// Default orbital altitude (kilometers).
pub const DEFAULT_ORBITAL_ALTITUDE_KM: f64 = 400.0;
/// Default satellite launch cooldown (ms).
pub const SATELLITE_LAUNCH_COOLDOWN_MS: u64 = 30_000;
/// Satellite starting health.
pub const SATELLITE_STARTING_HEALTH: f64 = 100.0;

// --- Radar / fog of war ---

/// Fallback radar range if a building doesn't specify one (kilometers).
pub const DEFAULT_RADAR_RANGE_KM: f64 = 1_500.0;
/// Satellite ground-vision cone half-angle (degrees), used for fog-of-war.
pub const SATELLITE_VISION_HALF_ANGLE_DEG: f64 = 25.0;
/// Coefficient in the geometric radar horizon formula `k * sqrt(altitude_m)`
/// (kilometers per sqrt-meter), accounting for atmospheric refraction.
pub const RADAR_HORIZON_COEFFICIENT: f64 = 3.57;
/// How many hops of satellite-to-relay-satellite chaining are allowed before
/// a satellite's comm link back to ground is considered broken.
pub const SATELLITE_RELAY_HOPS_MAX: u32 = 1;

// --- Hacking ---

/// How long a completed hack's compromise effect persists before lapsing (ms).
pub const HACK_COMPROMISE_DURATION_MS: u64 = 30_000;

// --- AI ---

/// Minimum/maximum jitter (ms) between AI salvo decisions at DEFCON 1.
pub const AI_SALVO_INTERVAL_MIN_MS: u64 = 15_000;
pub const AI_SALVO_INTERVAL_MAX_MS: u64 = 45_000;
/// Number of top cities (by population) the AI considers per salvo.
pub const AI_TOP_CITY_TARGETS: usize = 3;

// --- Connection manager ---

/// Bounded outbound channel capacity per connection; exceeding this drops
/// the connection (§4.1's "high-water mark").
pub const CONNECTION_CHANNEL_CAPACITY: usize = 256;

/// Idle-lobby reap period (seconds, §5).
pub const LOBBY_IDLE_REAP_SECS: u64 = 1800;
