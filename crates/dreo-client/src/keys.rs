//! Property keys reported by Dreo devices

pub const CONNECTED: &str = "connected";
pub const POWER_ON: &str = "poweron";
pub const MODE: &str = "mode";
pub const WIND_LEVEL: &str = "windlevel";
pub const OSCILLATE: &str = "oscon";

pub const LIGHT_ON: &str = "lighton";
pub const BRIGHTNESS: &str = "brightness";
pub const COLOR_TEMP: &str = "colortemp";

pub const ATM_ON: &str = "atmon";
pub const ATM_BRIGHTNESS: &str = "atmbri";
pub const ATM_COLOR: &str = "atmcolor";

pub const TEMPERATURE: &str = "temperature";
pub const TARGET_TEMPERATURE: &str = "ecolevel";
pub const PTC_ON: &str = "ptcon";

pub const HUMIDITY: &str = "rh";
pub const TARGET_HUMIDITY: &str = "rhautolevel";

pub const DISPLAY_ALWAYS_ON: &str = "ledalwayson";
pub const PANEL_SOUND: &str = "voiceon";
pub const CHILD_LOCK: &str = "childlockon";

pub const PM25: &str = "pm25";
pub const WORK_TIME: &str = "worktime";
pub const FILTER_LIFE: &str = "filtertime";

pub const HORIZONTAL_ANGLE: &str = "hangleswing";
pub const VERTICAL_ANGLE: &str = "vangleswing";
pub const TIMER_OFF: &str = "timeroff";
