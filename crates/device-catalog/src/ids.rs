//! Numeric field ids of the variables, errors and methods published for each
//! device type.

// Edge (1000)
pub const EDGE_STATE: u32 = 1001;
pub const EDGE_POSITION: u32 = 1002;
pub const EDGE_FIND_MATRIX: u32 = 1011;
pub const EDGE_ALIGN: u32 = 1012;
pub const EDGE_MOVE: u32 = 1013;
pub const EDGE_READ: u32 = 1014;
pub const EDGE_START: u32 = 1015;
pub const EDGE_STOP: u32 = 1020;

// MPES (1100)
pub const MPES_STATE: u32 = 1101;
pub const MPES_X_CENTROID_AVG: u32 = 1102;
pub const MPES_Y_CENTROID_AVG: u32 = 1103;
pub const MPES_X_CENTROID_SD: u32 = 1104;
pub const MPES_Y_CENTROID_SD: u32 = 1105;
pub const MPES_CLEANED_INTENSITY: u32 = 1106;
pub const MPES_X_CENTROID_NOMINAL: u32 = 1107;
pub const MPES_Y_CENTROID_NOMINAL: u32 = 1108;
pub const MPES_START: u32 = 1111;
pub const MPES_STOP: u32 = 1112;
pub const MPES_READ: u32 = 1113;
pub const MPES_SET_EXPOSURE: u32 = 1114;

// Panel (2000)
pub const PANEL_STATE: u32 = 2001;
pub const PANEL_EXTERNAL_TEMPERATURE: u32 = 2002;
pub const PANEL_INTERNAL_TEMPERATURE: u32 = 2003;
pub const PANEL_X: u32 = 2004;
pub const PANEL_Y: u32 = 2005;
pub const PANEL_Z: u32 = 2006;
pub const PANEL_X_ROT: u32 = 2007;
pub const PANEL_Y_ROT: u32 = 2008;
pub const PANEL_Z_ROT: u32 = 2009;
pub const PANEL_SAFETY_RADIUS: u32 = 2010;
pub const PANEL_MOVE_DELTA_LENGTHS: u32 = 2011;
pub const PANEL_MOVE_TO_LENGTHS: u32 = 2012;
pub const PANEL_MOVE_TO_COORDS: u32 = 2013;
pub const PANEL_READ_POSITION: u32 = 2014;
pub const PANEL_FIND_HOME: u32 = 2015;
pub const PANEL_CLEAR_ERROR: u32 = 2016;
pub const PANEL_CLEAR_ALL_ERRORS: u32 = 2017;
pub const PANEL_CLEAR_ACTUATOR_ERRORS: u32 = 2018;
pub const PANEL_CLEAR_PLATFORM_ERRORS: u32 = 2019;
pub const PANEL_STOP: u32 = 2020;

// Actuator (2100)
pub const ACTUATOR_STATE: u32 = 2101;
pub const ACTUATOR_CURRENT_LENGTH: u32 = 2102;
pub const ACTUATOR_TARGET_LENGTH: u32 = 2103;
pub const ACTUATOR_DELTA_LENGTH: u32 = 2104;
pub const ACTUATOR_START: u32 = 2111;
pub const ACTUATOR_STOP: u32 = 2112;
pub const ACTUATOR_MOVE_DELTA_LENGTH: u32 = 2113;
pub const ACTUATOR_MOVE_TO_LENGTH: u32 = 2114;
pub const ACTUATOR_CLEAR_ERROR: u32 = 2115;
pub const ACTUATOR_CLEAR_ALL_ERRORS: u32 = 2116;
pub const ACTUATOR_ERROR0: u32 = 2900;
pub const ACTUATOR_ERROR1: u32 = 2901;
pub const ACTUATOR_ERROR2: u32 = 2902;
pub const ACTUATOR_ERROR3: u32 = 2903;
pub const ACTUATOR_ERROR4: u32 = 2904;
pub const ACTUATOR_ERROR5: u32 = 2905;
pub const ACTUATOR_ERROR6: u32 = 2906;
pub const ACTUATOR_ERROR7: u32 = 2907;
pub const ACTUATOR_ERROR8: u32 = 2908;
pub const ACTUATOR_ERROR9: u32 = 2909;
pub const ACTUATOR_ERROR10: u32 = 2910;
pub const ACTUATOR_ERROR11: u32 = 2911;
pub const ACTUATOR_ERROR12: u32 = 2912;
pub const ACTUATOR_ERROR13: u32 = 2913;

// CCD (3100)
pub const CCD_STATE: u32 = 3101;
pub const CCD_X_FROM_LED: u32 = 3102;
pub const CCD_Y_FROM_LED: u32 = 3103;
pub const CCD_Z_FROM_LED: u32 = 3104;
pub const CCD_PSI_FROM_LED: u32 = 3105;
pub const CCD_THETA_FROM_LED: u32 = 3106;
pub const CCD_PHI_FROM_LED: u32 = 3107;
pub const CCD_X_NOMINAL: u32 = 3108;
pub const CCD_Y_NOMINAL: u32 = 3109;
pub const CCD_Z_NOMINAL: u32 = 3110;
pub const CCD_PSI_NOMINAL: u32 = 3111;
pub const CCD_THETA_NOMINAL: u32 = 3112;
pub const CCD_PHI_NOMINAL: u32 = 3113;
pub const CCD_START: u32 = 3121;
pub const CCD_STOP: u32 = 3122;
pub const CCD_READ: u32 = 3123;

// PSD (3200)
pub const PSD_STATE: u32 = 3201;
pub const PSD_X1: u32 = 3202;
pub const PSD_Y1: u32 = 3203;
pub const PSD_X2: u32 = 3204;
pub const PSD_Y2: u32 = 3205;
pub const PSD_DX1: u32 = 3206;
pub const PSD_DY1: u32 = 3207;
pub const PSD_DX2: u32 = 3208;
pub const PSD_DY2: u32 = 3209;
pub const PSD_TEMP: u32 = 3210;
pub const PSD_READ: u32 = 3220;

// Rangefinder (3300)
pub const RANGEFINDER_STATE: u32 = 3301;
pub const RANGEFINDER_TEMP: u32 = 3302;
pub const RANGEFINDER_TURN_ON: u32 = 3311;
pub const RANGEFINDER_TURN_OFF: u32 = 3312;
pub const RANGEFINDER_READ: u32 = 3313;
