//! Fixed parameters of the universal hash used to bucket unit keys.
//!
//! `hash(x) = (A[i] * (x & 0xFFFFFFFF) + B[i]) mod P` where `i` is the
//! parameter index assigned to the key component.

/// Number of parameter pairs available to unit key components.
pub const HASH_PARAMETER_COUNT: usize = 255;

/// Mersenne prime modulus, `2^31 - 1`.
pub const HASH_P: i64 = 2_147_483_647;

/// Multipliers.
pub const HASH_A: [i64; HASH_PARAMETER_COUNT] = [
    1341504661, 665956287, 431491107, 1335278997, 396946527, 703897305, 1984561111, 362176395,
    655741751, 1081711543, 1405927759, 1734660673, 1099383871, 1178756025, 39446973, 1966157063,
    15636249, 669480169, 84255615, 403639351, 1143125353, 1298593229, 115852241, 1783001137,
    963248377, 437802077, 567329307, 152750621, 630117869, 619928111, 694476233, 1866921441,
    973781549, 263097097, 801317809, 1864450487, 135488279, 1061903937, 1996216591, 110482725,
    1887426355, 305533105, 121602725, 2112365967, 117285921, 310001753, 1571174427, 1521872841,
    898039841, 815548043, 1351999187, 921825107, 1381788659, 2097125217, 2058595281, 1507079751,
    251799607, 294398823, 1976238797, 898834071, 946841867, 1854445907, 1487138231, 883965755,
    614338951, 1700834799, 2078110943, 424266815, 1003134603, 1663333813, 501771397, 1942804203,
    1636532393, 1973554943, 1075443763, 1379319689, 1643684825, 1646734557, 1384131999, 2028126547,
    1350750579, 1159399649, 589572609, 2106624271, 91822789, 455049343, 1612413723, 406971273,
    1509722157, 2025604159, 1725687413, 113467623, 1854458725, 1596589107, 2118420527, 1523162139,
    451662827, 1554494773, 105807449, 942821021, 1511792093, 1022521251, 1430579009, 855114905,
    1999826067, 860426145, 66506099, 1613760907, 884756519, 1095097311, 1193325049, 133243355,
    1501652449, 206693649, 606631363, 265791803, 1615509265, 1264853619, 1108556199, 1135356637,
    473618855, 1524061083, 1916437941, 517152483, 1510006791, 1249305641, 666288619, 696399355,
    215359045, 993020067, 598139107, 997036469, 615743613, 1596212205, 792624589, 569624527,
    542667473, 774757317, 1384024005, 1593764201, 251745159, 842173155, 252751329, 1103145875,
    745466261, 1093498397, 1463201521, 471283729, 2107446893, 1652444095, 1063230737, 248511635,
    1829534839, 886537333, 1813693603, 1716417671, 539705417, 90871683, 777949745, 2106957333,
    1999765395, 290737453, 1143633901, 1592793165, 747279327, 1339964475, 372972239, 1153400207,
    331939219, 529277433, 1349077875, 1416922183, 1991147997, 1645661129, 2008718301, 807948191,
    392099797, 645705937, 593552119, 2142046373, 771707559, 1968476205, 171462835, 604994147,
    151544161, 1562783033, 1445429625, 565986757, 1026364835, 193932323, 368908363, 446813279,
    2144103743, 906583825, 1406410687, 393333959, 685819643, 1522867859, 1211992271, 2120897467,
    625066741, 959985027, 1184413685, 1423582581, 702179713, 1710183271, 1539349839, 1953894005,
    1505378309, 1668169969, 757133567, 866901655, 389119949, 1946818527, 1091432165, 416767975,
    691879575, 1738243371, 1174245819, 2078484525, 1752604797, 423219051, 151879025, 1060588905,
    301444487, 1987143803, 266103135, 1839496229, 704690413, 787028283, 1628967127, 1327745763,
    813191659, 1052682371, 1976763633, 348795011, 908292281, 379867379, 5129531, 277790951,
    1885533967, 186433109, 1045080499, 1369919213, 1688462981, 1639455369, 644044451, 1005543411,
    2146511417, 303377175, 561630793, 768978933, 1075937045, 1802175841, 2001365607,
];

/// Offsets.
pub const HASH_B: [i64; HASH_PARAMETER_COUNT] = [
    305151913, 1506487997, 1220166885, 2038725529, 1493588191, 882708833, 502659797, 1753355701,
    2089272317, 1318825407, 1938536723, 645606305, 989707687, 1115072591, 828768127, 255017641,
    1031488429, 1616384115, 37399941, 654299111, 1791296391, 1200516397, 1068419449, 806265485,
    281425215, 5012537, 1690371387, 1691939763, 1898703933, 2023773437, 1545462115, 1473891437,
    469889727, 199361307, 1541570047, 1642715185, 692492863, 1136969099, 1336193203, 1434203261,
    2093568295, 1404312895, 774335231, 942267543, 1941694517, 956233111, 2005733023, 1780375043,
    2083780351, 810422717, 741642387, 1072086357, 239577411, 811596489, 924667777, 1803078625,
    429817381, 2073334687, 159997053, 1922748875, 1853010643, 1968284669, 1366012467, 1909033341,
    356690467, 877153277, 1338742717, 1281155797, 2074617381, 254207927, 1627130695, 2066721413,
    1603453817, 1575878553, 767468449, 186112941, 1959079389, 1721822709, 1613498061, 1352245171,
    2130941145, 1132139875, 902872021, 1449265819, 388143509, 2120879447, 1708696773, 1957326657,
    226165267, 1825650277, 1017514035, 544075587, 495481013, 1784715093, 1396309169, 654696457,
    852907691, 1674370791, 1981129015, 2050000505, 671913693, 1824317241, 180471051, 1066099387,
    1119924849, 188295207, 191589155, 88783329, 640247761, 1829764465, 1420037759, 899569281,
    639807223, 1598645021, 469823391, 2119065095, 694643313, 98347021, 247268571, 1385069571,
    680378797, 875708555, 411896689, 901635367, 1788428745, 1873785499, 49318987, 21285065,
    939097941, 1175189669, 2078687537, 1264074387, 343083477, 1036501611, 1614007137, 306616139,
    556782627, 645081645, 2044787767, 382309665, 268393241, 1595275357, 2124847155, 724311687,
    976730521, 60460489, 422288659, 2065623877, 1445853427, 576986589, 373029849, 1260658149,
    732595329, 1724154887, 1006851203, 324098519, 1103502731, 768425059, 1622165743, 357753863,
    311650033, 1430057257, 1386632517, 1169921221, 553000941, 667337281, 825422335, 1073478491,
    1580153521, 1278560789, 1324849009, 870289903, 1523688147, 176965717, 1964907291, 2057108921,
    1797125409, 1130722407, 111802731, 1110049115, 1772164847, 1542729223, 635210333, 2053872145,
    1770591479, 1616874267, 692488133, 1392913887, 2107945903, 1605735279, 236790011, 1029779025,
    720605627, 1099998111, 596363231, 216238235, 694862945, 622527209, 84041225, 605899437,
    450910221, 2029426077, 2145409593, 1281666819, 1469156365, 531670091, 437174599, 890945083,
    893685999, 884351261, 140275243, 1410011673, 633730985, 1119353031, 797735879, 1785547051,
    653884741, 1806503659, 1378159793, 1928444665, 516675475, 1480666215, 1937459295, 1023137715,
    1637541653, 1470468299, 478751255, 838167039, 1162169065, 584342719, 311893947, 1398148749,
    908970647, 690289015, 1249960863, 1281897297, 1565376007, 617383393, 1942580161, 159744107,
    1297776801, 1383320665, 1847365213, 787394851, 672329317, 592385189, 2084622711, 52550557,
    494388021, 1839786467, 1081634495, 1258637473, 1605155357, 555014629, 2103173303,
];
