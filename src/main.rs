//! Command-line front end.
//!
//! ```text
//! tripcast weather [--city Q | --here | --reset] [--watch]
//! tripcast trips list
//! tripcast trips add --from 2024-06-01 --to 2024-06-07 [--city Q]
//! tripcast trips edit <id> [--city C] [--country C] [--from D] [--to D] [--relocate Q]
//! tripcast trips delete <id>
//! tripcast register <email> --name N --password P
//! tripcast login <email> --password P
//! tripcast logout
//! tripcast theme [dark|light|toggle]
//! tripcast map [--city Q] [--zoom 10]
//! ```

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc::UnboundedReceiver;

use tripcast_app::{App, Notification, NotificationKind, Trigger};
use tripcast_core::{AppError, Config, Theme};
use tripcast_trips::{DateRange, TripId};
use tripcast_weather::{tile_for, TileLayer, WeatherIcon, MAX_ZOOM};

#[derive(Parser)]
#[command(name = "tripcast", about = "Weather dashboard and trip planner")]
struct Cli {
    /// Start in dark mode when no theme has been saved
    #[arg(long, global = true)]
    prefers_dark: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current conditions and forecast
    Weather {
        /// Search for a place by name
        #[arg(long, conflicts_with_all = ["here", "reset"])]
        city: Option<String>,
        /// Use the device position
        #[arg(long, conflicts_with = "reset")]
        here: bool,
        /// Go back to the saved initial location
        #[arg(long)]
        reset: bool,
        /// Keep running and refresh periodically
        #[arg(long)]
        watch: bool,
    },
    /// Manage saved trips
    Trips {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// Create an account
    Register {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show or change the color theme
    Theme { mode: Option<ThemeArg> },
    /// Print map tile URLs around a location
    Map {
        #[arg(long)]
        city: Option<String>,
        #[arg(
            long,
            default_value = "10",
            value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_ZOOM))
        )]
        zoom: u8,
    },
}

#[derive(Subcommand)]
enum TripCommands {
    /// List your trips with current weather at each
    List,
    /// Save a trip to the current or searched location
    Add {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        city: Option<String>,
    },
    /// Edit a trip in place
    Edit {
        id: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Look up a new place and use its city, country and coordinates
        #[arg(long)]
        relocate: Option<String>,
    },
    /// Delete a trip
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    tripcast_core::init()?;
    let cli = Cli::parse();

    let (config, _validation) = Config::load_validated()?;
    let (mut app, mut notifications) = App::new(config, cli.prefers_dark)?;
    app.initialize();

    let result = run(&app, cli.command, &mut notifications).await;
    let reported = print_notifications(&mut notifications);

    app.shutdown().await;

    if let Err(e) = result {
        tracing::error!("Command failed: {}", e);
        if !reported {
            eprintln!("✗ {}", e.user_message());
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    app: &App,
    command: Commands,
    notifications: &mut UnboundedReceiver<Notification>,
) -> Result<(), AppError> {
    match command {
        Commands::Weather {
            city,
            here,
            reset,
            watch,
        } => {
            app.require_user().await?;
            let trigger = match (city, here, reset) {
                (Some(query), _, _) => Trigger::Search(query),
                (None, true, _) => Trigger::CurrentPosition,
                (None, false, true) => Trigger::Reset,
                (None, false, false) => Trigger::Mount,
            };
            app.load_weather(trigger).await?;
            print_weather(app);

            if watch {
                watch_weather(app, notifications).await?;
            }
        }
        Commands::Trips { command } => run_trips(app, command).await?,
        Commands::Register {
            email,
            name,
            password,
        } => {
            let user = app.register(&email, &password, &name).await?;
            println!("Registered {}", user.email);
        }
        Commands::Login { email, password } => {
            let user = app.login(&email, &password).await?;
            println!(
                "Signed in as {}",
                user.display_name.as_deref().unwrap_or(&user.email)
            );
        }
        Commands::Logout => {
            app.logout()?;
            println!("Signed out");
        }
        Commands::Theme { mode } => {
            let theme = app.theme();
            match mode {
                None => {}
                Some(ThemeArg::Dark) => theme.set(Theme::Dark)?,
                Some(ThemeArg::Light) => theme.set(Theme::Light)?,
                Some(ThemeArg::Toggle) => {
                    theme.toggle()?;
                }
            }
            println!("Theme: {}", theme.current().as_str());
        }
        Commands::Map { city, zoom } => {
            let trigger = city.map_or(Trigger::Mount, Trigger::Search);
            app.load_weather(trigger).await?;
            print_map(app, zoom).await;
        }
    }
    Ok(())
}

async fn run_trips(app: &App, command: TripCommands) -> Result<(), AppError> {
    match command {
        TripCommands::List => {
            let (trips, overlay) = app.my_trips_with_weather().await?;
            if trips.is_empty() {
                println!("No trips saved yet.");
                return Ok(());
            }

            let unit = app.config().weather.units.symbol();
            println!("{:<38} {:<24} {:<25} WEATHER", "ID", "PLACE", "DATES");
            println!("{}", "-".repeat(100));
            for trip in &trips {
                let weather = match overlay.get(&trip.id) {
                    Some(Ok(w)) => format!(
                        "{} {}{} {}",
                        w.icon().glyph(),
                        w.temperature,
                        unit,
                        w.description
                    ),
                    _ => "unavailable".to_string(),
                };
                println!(
                    "{:<38} {:<24} {:<25} {}",
                    trip.id.as_str(),
                    trip.location().label(),
                    format!("{} → {}", trip.departure_date, trip.arrival_date),
                    weather
                );
            }
            println!("\n{} trip(s)", trips.len());
        }
        TripCommands::Add { from, to, city } => {
            app.require_user().await?;
            let trigger = city.map_or(Trigger::Mount, Trigger::Search);
            app.load_weather(trigger).await?;
            let id = app.save_trip(DateRange { from, to }).await?;
            println!("Saved trip {}", id);
        }
        TripCommands::Edit {
            id,
            city,
            country,
            from,
            to,
            relocate,
        } => {
            let id = TripId::from(id.as_str());
            app.my_trips().await?;
            let mut draft = app.draft_for(&id)?;
            if let Some(city) = city {
                draft.city = city;
            }
            if let Some(country) = country {
                draft.country = country;
            }
            if from.is_some() {
                draft.dates.from = from;
            }
            if to.is_some() {
                draft.dates.to = to;
            }
            app.edit_trip(&id, draft, relocate.as_deref()).await?;
        }
        TripCommands::Delete { id } => {
            app.delete_trip(&TripId::from(id.as_str())).await?;
        }
    }
    Ok(())
}

/// Refresh on the configured schedule and reprint after each refresh until Ctrl-C
async fn watch_weather(
    app: &App,
    notifications: &mut UnboundedReceiver<Notification>,
) -> Result<(), AppError> {
    let minutes = app.config().weather.refresh_minutes;
    if minutes == 0 {
        println!("Periodic refresh is disabled (weather.refresh_minutes = 0)");
        return Ok(());
    }

    let period = std::time::Duration::from_secs(u64::from(minutes) * 60);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                // Failures land in the weather store and print below
                let _ = app.load_weather(Trigger::Periodic).await;
                print_notifications(notifications);
                print_weather(app);
            }
        }
    }
    Ok(())
}

fn print_weather(app: &App) {
    let units = app.config().weather.units;
    let sync = app.sync();
    let location = sync.location_store().snapshot();
    let weather = sync.weather_store().snapshot();

    if let Some(loc) = &location.location {
        println!("{} ({})", loc.label(), loc.coords);
    }
    if let Some(error) = &weather.error {
        println!("  ! {}", error);
    }

    let Some(current) = &weather.current else {
        return;
    };
    println!(
        "  {} {}{}  {} (feels like {}{})",
        current.icon().glyph(),
        current.temperature,
        units.symbol(),
        current.description,
        current.feels_like,
        units.symbol()
    );
    println!(
        "  Wind {:.1} {} {}  Humidity {}%  Pressure {} hPa  Visibility {:.1} km",
        current.wind_speed,
        units.wind_unit(),
        current.wind_direction,
        current.humidity_pct,
        current.pressure_hpa,
        current.visibility_km
    );
    println!(
        "  Dew point ~{:.0}{}  UV {}",
        current.dew_point_estimate,
        units.symbol(),
        current
            .uv_index
            .map_or_else(|| "n/a".to_string(), |uv| format!("{:.1}", uv))
    );

    if !weather.hourly.is_empty() {
        println!("\nNext 24 hours");
        for hour in &weather.hourly {
            println!(
                "  {}  {} {}{}",
                hour.time.format("%H:%M"),
                WeatherIcon::from_icon_id(&hour.icon_id).glyph(),
                hour.temperature,
                units.symbol()
            );
        }
    }

    if !weather.daily.is_empty() {
        println!("\n5-day outlook");
        for day in &weather.daily {
            println!(
                "  {:<12} {} {}{}  {}",
                day.display_day,
                WeatherIcon::from_icon_id(&day.icon_id).glyph(),
                day.temperature,
                units.symbol(),
                day.description
            );
        }
    }
}

async fn print_map(app: &App, zoom: u8) {
    let Some(location) = app.sync().location_store().current() else {
        return;
    };

    let (x, y) = tile_for(location.coords.lat, location.coords.lon, zoom);
    println!("{} at z{} tile {}/{}", location.label(), zoom, x, y);

    let layers = [
        TileLayer::street(),
        TileLayer::temperature(&app.config().weather.api_key),
    ];
    for layer in &layers {
        println!(
            "  {:<12} (opacity {:.1}) {}",
            layer.name,
            layer.opacity,
            layer.tile_url(zoom, x, y)
        );
    }

    if app.auth().is_authenticated() {
        if let Ok(trips) = app.my_trips().await {
            for trip in trips {
                let (tx, ty) = tile_for(trip.coords.lat, trip.coords.lon, zoom);
                println!("  marker {:<24} tile {}/{}", trip.location().label(), tx, ty);
            }
        }
    }
}

/// Print pending notifications; true if any was an error
fn print_notifications(notifications: &mut UnboundedReceiver<Notification>) -> bool {
    let mut saw_error = false;
    while let Ok(note) = notifications.try_recv() {
        match note.kind {
            NotificationKind::Success => println!("✓ {}", note.message),
            NotificationKind::Error => {
                saw_error = true;
                eprintln!("✗ {}", note.message);
            }
        }
    }
    saw_error
}
